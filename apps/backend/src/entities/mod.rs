pub mod escrow_transactions;
pub mod waitlist_entries;
pub mod waitlist_group_members;
pub mod waitlist_groups;

pub use escrow_transactions::Entity as EscrowTransactions;
pub use waitlist_entries::Entity as WaitlistEntries;
pub use waitlist_group_members::Entity as WaitlistGroupMembers;
pub use waitlist_groups::Entity as WaitlistGroups;
