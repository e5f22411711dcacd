use std::sync::Arc;

use crate::config::db::{DbKind, RuntimeEnv};
use crate::config::policy::SeatingPolicy;
use crate::directory::{HomeGameDirectory, StaticHomeGameDirectory};
use crate::error::AppError;
use crate::events::{EventSink, TracingEventSink};
use crate::infra::db::bootstrap_db;
use crate::state::app_state::AppState;

/// Builder for creating AppState instances (used by embedding services and tests)
pub struct StateBuilder {
    env: RuntimeEnv,
    db_kind: Option<DbKind>,
    policy: SeatingPolicy,
    directory: Arc<dyn HomeGameDirectory>,
    events: Arc<dyn EventSink>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            env: RuntimeEnv::Prod,
            db_kind: None,
            policy: SeatingPolicy::default(),
            directory: Arc::new(StaticHomeGameDirectory::new()),
            events: Arc::new(TracingEventSink),
        }
    }

    pub fn with_env(mut self, env: RuntimeEnv) -> Self {
        self.env = env;
        self
    }

    pub fn with_db(mut self, kind: DbKind) -> Self {
        self.db_kind = Some(kind);
        self
    }

    pub fn with_policy(mut self, policy: SeatingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_directory(mut self, directory: Arc<dyn HomeGameDirectory>) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        self.policy.validate()?;
        match self.db_kind {
            Some(kind) => {
                // single entrypoint: connect + migrate
                let conn = bootstrap_db(self.env, kind).await?;
                Ok(AppState::new(conn, self.policy, self.directory, self.events))
            }
            None => {
                let mut state = AppState::without_db();
                state.policy = self.policy;
                state.directory = self.directory;
                state.events = self.events;
                Ok(state)
            }
        }
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
