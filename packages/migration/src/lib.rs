//! Seatline schema: one migration creating the waitlist, squad and escrow
//! tables, plus the command runner shared by the CLI and the state builder.

pub use sea_orm_migration::prelude::*;
pub use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseConnection};
use tracing::{error, info};

mod m20261017_000001_seating; // keep filename + module name in sync

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20261017_000001_seating::Migration)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationCommand {
    Up,
    Down,
    Fresh,
    Reset,
    Refresh,
    Status,
}

impl MigrationCommand {
    /// Every command except `Status` can change the schema.
    pub fn changes_schema(self) -> bool {
        self != MigrationCommand::Status
    }
}

/// Run `command` against an open connection, logging how many migrations
/// were pending before and after.
pub async fn migrate(db: &DatabaseConnection, command: MigrationCommand) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let defined = Migrator::migrations().len();
    let pending = pending_count(db).await?;
    info!(?command, ?backend, defined, pending, "running migration command");

    let result = match command {
        MigrationCommand::Up => Migrator::up(db, None).await,
        MigrationCommand::Down => Migrator::down(db, None).await,
        MigrationCommand::Fresh => Migrator::fresh(db).await,
        MigrationCommand::Reset => Migrator::reset(db).await,
        MigrationCommand::Refresh => Migrator::refresh(db).await,
        MigrationCommand::Status => Migrator::status(db).await,
    };
    if let Err(e) = result {
        error!(?command, ?backend, error = %e, "migration command failed");
        return Err(e);
    }

    if command.changes_schema() {
        let pending = pending_count(db).await?;
        info!(?command, defined, pending, "migration command ok");
    } else {
        info!(?command, "migration status reported");
    }
    Ok(())
}

async fn pending_count(db: &DatabaseConnection) -> Result<usize, DbErr> {
    Ok(Migrator::get_pending_migrations(db).await?.len())
}
