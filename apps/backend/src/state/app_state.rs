use std::fmt;
use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::policy::SeatingPolicy;
use crate::directory::{HomeGameDirectory, StaticHomeGameDirectory};
use crate::events::{EventSink, TracingEventSink};

/// Shared resources for every core operation
#[derive(Clone)]
pub struct AppState {
    /// Database connection (absent when running without storage)
    pub db: Option<DatabaseConnection>,
    pub policy: SeatingPolicy,
    /// Read-only home game lookups
    pub directory: Arc<dyn HomeGameDirectory>,
    /// Receives events after commit
    pub events: Arc<dyn EventSink>,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        policy: SeatingPolicy,
        directory: Arc<dyn HomeGameDirectory>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            db: Some(db),
            policy,
            directory,
            events,
        }
    }

    /// State without a database; every storage-backed operation fails with
    /// `DB_UNAVAILABLE`.
    pub fn without_db() -> Self {
        Self {
            db: None,
            policy: SeatingPolicy::default(),
            directory: Arc::new(StaticHomeGameDirectory::new()),
            events: Arc::new(TracingEventSink),
        }
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("db", &self.db.is_some())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
