//! Tunable seating and squad policy.

use std::env;
use std::str::FromStr;

use crate::error::AppError;

/// Smallest squad a leader may create.
pub const MIN_SQUAD_SIZE: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatingPolicy {
    /// Confirmed members (leader included) required before a squad may
    /// be submitted to the waitlist.
    pub min_confirmed_members: u32,
    /// Direct joins (by invite code or self-join) start confirmed.
    pub auto_confirm_direct_join: bool,
    pub wait_minutes_per_position: u32,
    pub max_squad_size: i32,
    pub invite_code_len: usize,
    pub invite_code_attempts: u32,
}

impl Default for SeatingPolicy {
    fn default() -> Self {
        Self {
            min_confirmed_members: 2,
            auto_confirm_direct_join: false,
            wait_minutes_per_position: 15,
            max_squad_size: 10,
            invite_code_len: 8,
            invite_code_attempts: 5,
        }
    }
}

impl SeatingPolicy {
    /// Defaults overridden by any `SEATLINE_*` variables that are set.
    pub fn from_env() -> Result<Self, AppError> {
        let d = Self::default();
        let policy = Self {
            min_confirmed_members: var_or(
                "SEATLINE_MIN_CONFIRMED_MEMBERS",
                d.min_confirmed_members,
            )?,
            auto_confirm_direct_join: var_or(
                "SEATLINE_AUTO_CONFIRM_DIRECT_JOIN",
                d.auto_confirm_direct_join,
            )?,
            wait_minutes_per_position: var_or(
                "SEATLINE_WAIT_MINUTES_PER_POSITION",
                d.wait_minutes_per_position,
            )?,
            max_squad_size: var_or("SEATLINE_MAX_SQUAD_SIZE", d.max_squad_size)?,
            invite_code_len: var_or("SEATLINE_INVITE_CODE_LEN", d.invite_code_len)?,
            invite_code_attempts: var_or("SEATLINE_INVITE_CODE_ATTEMPTS", d.invite_code_attempts)?,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.min_confirmed_members < 1 {
            return Err(AppError::config(
                "min_confirmed_members must count at least the leader",
            ));
        }
        if self.max_squad_size < MIN_SQUAD_SIZE {
            return Err(AppError::config(format!(
                "max_squad_size must be at least {MIN_SQUAD_SIZE}"
            )));
        }
        if self.min_confirmed_members as i64 > self.max_squad_size as i64 {
            return Err(AppError::config(
                "min_confirmed_members cannot exceed max_squad_size",
            ));
        }
        if !(4..=32).contains(&self.invite_code_len) {
            return Err(AppError::config("invite_code_len must be within 4..=32"));
        }
        if self.invite_code_attempts == 0 {
            return Err(AppError::config("invite_code_attempts must be positive"));
        }
        Ok(())
    }

    /// Estimated wait for the back of a bucket whose highest position is `max_position`.
    pub fn estimated_wait_minutes(&self, max_position: i32) -> i64 {
        i64::from(max_position.max(0)) * i64::from(self.wait_minutes_per_position)
    }
}

fn var_or<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("Invalid value '{raw}' for {name}"))),
        Err(_) => Ok(default),
    }
}
