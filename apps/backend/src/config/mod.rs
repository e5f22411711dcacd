pub mod db;
pub mod policy;
