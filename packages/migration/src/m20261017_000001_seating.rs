use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum WaitlistEntries {
    Table,
    Id,
    VenueId,
    GameType,
    Stakes,
    PlayerId,
    GroupId,
    Position,
    Status,
    SignupMethod,
    CallCount,
    LastCalledAt,
    SeatedAt,
    RemovedAt,
    RemovedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum WaitlistGroups {
    Table,
    Id,
    VenueId,
    GameType,
    Stakes,
    LeaderId,
    InviteCode,
    MaxSize,
    Status,
    EntryId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum WaitlistGroupMembers {
    Table,
    Id,
    GroupId,
    PlayerId,
    IsLeader,
    MemberStatus,
    JoinedAt,
}

#[derive(Iden)]
enum EscrowTransactions {
    Table,
    Id,
    HomeGameId,
    PlayerId,
    Amount,
    Status,
    PaymentMethod,
    PaymentReference,
    CreatedAt,
    HeldAt,
    ReleasedAt,
    ReleasedTo,
    RefundedAt,
    Notes,
    UpdatedAt,
}

/// Partial unique indexes are not expressible through the index builder on every
/// backend, so they are issued as plain SQL. The syntax is shared by Postgres and SQLite.
const PARTIAL_UNIQUE_INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS waitlist_entries_active_player_uq \
     ON waitlist_entries (venue_id, game_type, stakes, player_id) \
     WHERE status IN ('WAITING', 'CALLED')",
    "CREATE UNIQUE INDEX IF NOT EXISTS waitlist_entries_active_group_uq \
     ON waitlist_entries (group_id) \
     WHERE status IN ('WAITING', 'CALLED')",
    "CREATE UNIQUE INDEX IF NOT EXISTS waitlist_group_members_active_uq \
     ON waitlist_group_members (group_id, player_id) \
     WHERE member_status <> 'DECLINED'",
    "CREATE UNIQUE INDEX IF NOT EXISTS escrow_transactions_open_uq \
     ON escrow_transactions (home_game_id, player_id) \
     WHERE status IN ('PENDING', 'HELD')",
];

/// Positions are dense per bucket, so no two active entries share one.
/// Deferred to commit: the gap shift moves rows through each other's slots.
/// Postgres only; SQLite checks per row and its single writer covers this.
const ACTIVE_POSITION_EXCLUSION: &str = "ALTER TABLE waitlist_entries \
     ADD CONSTRAINT waitlist_entries_active_position_excl \
     EXCLUDE USING btree (venue_id WITH =, game_type WITH =, stakes WITH =, position WITH =) \
     WHERE (status IN ('WAITING', 'CALLED')) \
     DEFERRABLE INITIALLY DEFERRED";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // waitlist_groups (created first: entries reference groups)
        manager
            .create_table(
                Table::create()
                    .table(WaitlistGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WaitlistGroups::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(WaitlistGroups::VenueId).big_integer().not_null())
                    .col(ColumnDef::new(WaitlistGroups::GameType).string().not_null())
                    .col(ColumnDef::new(WaitlistGroups::Stakes).string().not_null())
                    .col(ColumnDef::new(WaitlistGroups::LeaderId).big_integer().not_null())
                    .col(ColumnDef::new(WaitlistGroups::InviteCode).string().not_null())
                    .col(
                        ColumnDef::new(WaitlistGroups::MaxSize)
                            .integer()
                            .not_null()
                            .check(Expr::col(WaitlistGroups::MaxSize).gte(2)),
                    )
                    .col(
                        ColumnDef::new(WaitlistGroups::Status)
                            .string()
                            .not_null()
                            .default("FORMING"),
                    )
                    .col(ColumnDef::new(WaitlistGroups::EntryId).big_integer().null())
                    .col(
                        ColumnDef::new(WaitlistGroups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistGroups::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("waitlist_groups_invite_code_uq")
                    .table(WaitlistGroups::Table)
                    .col(WaitlistGroups::VenueId)
                    .col(WaitlistGroups::InviteCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // waitlist_entries
        manager
            .create_table(
                Table::create()
                    .table(WaitlistEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WaitlistEntries::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(WaitlistEntries::VenueId).big_integer().not_null())
                    .col(ColumnDef::new(WaitlistEntries::GameType).string().not_null())
                    .col(ColumnDef::new(WaitlistEntries::Stakes).string().not_null())
                    .col(ColumnDef::new(WaitlistEntries::PlayerId).big_integer().null())
                    .col(ColumnDef::new(WaitlistEntries::GroupId).big_integer().null())
                    .col(
                        ColumnDef::new(WaitlistEntries::Position)
                            .integer()
                            .not_null()
                            .check(Expr::col(WaitlistEntries::Position).gte(1)),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::Status)
                            .string()
                            .not_null()
                            .default("WAITING"),
                    )
                    .col(ColumnDef::new(WaitlistEntries::SignupMethod).string().not_null())
                    .col(
                        ColumnDef::new(WaitlistEntries::CallCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::LastCalledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::SeatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::RemovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(WaitlistEntries::RemovedBy).big_integer().null())
                    .col(
                        ColumnDef::new(WaitlistEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_waitlist_entries_group_id")
                            .from(WaitlistEntries::Table, WaitlistEntries::GroupId)
                            .to(WaitlistGroups::Table, WaitlistGroups::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Bucket scans: ordering and max-position lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_waitlist_entries_bucket")
                    .table(WaitlistEntries::Table)
                    .col(WaitlistEntries::VenueId)
                    .col(WaitlistEntries::GameType)
                    .col(WaitlistEntries::Stakes)
                    .col(WaitlistEntries::Status)
                    .col(WaitlistEntries::Position)
                    .to_owned(),
            )
            .await?;

        // waitlist_group_members
        manager
            .create_table(
                Table::create()
                    .table(WaitlistGroupMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WaitlistGroupMembers::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(WaitlistGroupMembers::GroupId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistGroupMembers::PlayerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistGroupMembers::IsLeader)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(WaitlistGroupMembers::MemberStatus)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(WaitlistGroupMembers::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_waitlist_group_members_group_id")
                            .from(WaitlistGroupMembers::Table, WaitlistGroupMembers::GroupId)
                            .to(WaitlistGroups::Table, WaitlistGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // escrow_transactions
        manager
            .create_table(
                Table::create()
                    .table(EscrowTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EscrowTransactions::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(EscrowTransactions::HomeGameId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EscrowTransactions::PlayerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EscrowTransactions::Amount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(EscrowTransactions::Amount).gt(0)),
                    )
                    .col(
                        ColumnDef::new(EscrowTransactions::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(EscrowTransactions::PaymentMethod)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EscrowTransactions::PaymentReference)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EscrowTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EscrowTransactions::HeldAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EscrowTransactions::ReleasedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EscrowTransactions::ReleasedTo)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EscrowTransactions::RefundedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(EscrowTransactions::Notes).text().null())
                    .col(
                        ColumnDef::new(EscrowTransactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_escrow_transactions_home_game")
                    .table(EscrowTransactions::Table)
                    .col(EscrowTransactions::HomeGameId)
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();
        for stmt in PARTIAL_UNIQUE_INDEXES {
            conn.execute_unprepared(stmt).await?;
        }
        if manager.get_database_backend() == DatabaseBackend::Postgres {
            conn.execute_unprepared(ACTIVE_POSITION_EXCLUSION).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(EscrowTransactions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(WaitlistGroupMembers::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(WaitlistEntries::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(WaitlistGroups::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
