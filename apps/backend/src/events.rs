//! Domain events for the external notification dispatcher.
//!
//! Services push events into an [`Outbox`] while their transaction is open.
//! The façade drains the outbox only after the transaction commits, so an
//! event is never announced for a change that rolled back, and a failing sink
//! never undoes a committed change.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    EntryCalled {
        entry_id: i64,
        venue_id: i64,
        player_id: Option<i64>,
        group_id: Option<i64>,
        call_count: i32,
    },
    EntrySeated {
        entry_id: i64,
        venue_id: i64,
    },
    EntryRemoved {
        entry_id: i64,
        venue_id: i64,
        removed_by: i64,
    },
    SquadSubmitted {
        group_id: i64,
        entry_id: i64,
    },
    SquadDisbanded {
        group_id: i64,
        venue_id: i64,
        member_ids: Vec<i64>,
    },
    SquadMatched {
        group_id: i64,
        entry_id: i64,
    },
    DepositCreated {
        transaction_id: i64,
        home_game_id: i64,
        player_id: i64,
        amount: i64,
    },
    DepositHeld {
        transaction_id: i64,
        home_game_id: i64,
    },
    DepositReleased {
        transaction_id: i64,
        home_game_id: i64,
        released_to: i64,
        amount: i64,
    },
    DepositRefunded {
        transaction_id: i64,
        home_game_id: i64,
        player_id: i64,
        amount: i64,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::EntryCalled { .. } => "entry_called",
            DomainEvent::EntrySeated { .. } => "entry_seated",
            DomainEvent::EntryRemoved { .. } => "entry_removed",
            DomainEvent::SquadSubmitted { .. } => "squad_submitted",
            DomainEvent::SquadDisbanded { .. } => "squad_disbanded",
            DomainEvent::SquadMatched { .. } => "squad_matched",
            DomainEvent::DepositCreated { .. } => "deposit_created",
            DomainEvent::DepositHeld { .. } => "deposit_held",
            DomainEvent::DepositReleased { .. } => "deposit_released",
            DomainEvent::DepositRefunded { .. } => "deposit_refunded",
        }
    }
}

/// Receiver for committed domain events. Delivery is best effort.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &DomainEvent) -> Result<(), String>;
}

/// Writes each event as a structured log line.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: &DomainEvent) -> Result<(), String> {
        let payload = serde_json::to_string(event).map_err(|e| e.to_string())?;
        info!(event = event.name(), payload = %payload, "domain event");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _event: &DomainEvent) -> Result<(), String> {
        Ok(())
    }
}

/// Collects published events in memory.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, event: &DomainEvent) -> Result<(), String> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Events gathered during one transaction, pending publication.
#[derive(Debug, Default)]
pub struct Outbox {
    events: Vec<DomainEvent>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &[DomainEvent] {
        &self.events
    }

    /// Hand every event to `sink`. Failures are logged and dropped.
    pub fn publish_to(self, sink: &dyn EventSink) {
        for event in self.events {
            if let Err(err) = sink.publish(&event) {
                warn!(event = event.name(), error = %err, "event delivery failed");
            }
        }
    }
}
