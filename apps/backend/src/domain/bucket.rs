use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::domain::{DomainError, ValidationKind};

const MAX_LABEL_LEN: usize = 32;

/// Partition key for Position Ledger ordering: (venue, game type, stakes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bucket {
    pub venue_id: i64,
    pub game_type: String,
    pub stakes: String,
}

impl Bucket {
    /// Validated bucket with trimmed labels.
    pub fn new(
        venue_id: i64,
        game_type: impl AsRef<str>,
        stakes: impl AsRef<str>,
    ) -> Result<Self, DomainError> {
        if venue_id <= 0 {
            return Err(DomainError::validation(
                ValidationKind::Other("VenueId".into()),
                "Venue id must be positive",
            ));
        }
        Ok(Self {
            venue_id,
            game_type: label("game type", game_type.as_ref())?,
            stakes: label("stakes", stakes.as_ref())?,
        })
    }

    /// Key for the transaction-scoped lock serializing position changes.
    pub fn lock_key(&self) -> String {
        format!("bucket:{}:{}:{}", self.venue_id, self.game_type, self.stakes)
    }
}

fn label(what: &str, raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(
            ValidationKind::Other("EmptyLabel".into()),
            format!("{what} must not be empty"),
        ));
    }
    if trimmed.chars().count() > MAX_LABEL_LEN {
        return Err(DomainError::validation(
            ValidationKind::Other("LabelTooLong".into()),
            format!("{what} must be at most {MAX_LABEL_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.venue_id, self.game_type, self.stakes)
    }
}
