//! Password hashing policy and validation

use crate::error::{PeppermillError, Result};
use serde::{Deserialize, Serialize};

/// Bytes of input bcrypt actually consumes. Anything past this is silently
/// ignored by the primitive.
pub const BCRYPT_INPUT_LIMIT: usize = 72;

/// Work factor recommended by OWASP for bcrypt. Each step doubles the cost.
pub const DEFAULT_COST: u32 = 12;

/// Pepper length the default policy reserves room for.
pub const DEFAULT_PEPPER_LEN: usize = 16;

pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// How far above the configured cost a stored hash may go before verify
/// refuses to run it.
pub const STORED_COST_HEADROOM: u32 = 2;

/// Password hashing configuration.
///
/// `input_limit` is the window of the hash primitive and bounds
/// `password.len() + pepper.len()`. `max_password_len` is the policy limit on
/// the password alone and must leave room for a pepper inside that window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub cost: u32,
    pub input_limit: usize,
    pub max_password_len: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            cost: DEFAULT_COST,
            input_limit: BCRYPT_INPUT_LIMIT,
            max_password_len: BCRYPT_INPUT_LIMIT - DEFAULT_PEPPER_LEN,
        }
    }
}

impl PasswordPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy giving passwords every byte a pepper of `pepper_len` leaves free.
    pub fn for_pepper_len(pepper_len: usize) -> Result<Self> {
        let policy = Self {
            max_password_len: BCRYPT_INPUT_LIMIT.saturating_sub(pepper_len),
            ..Self::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    #[must_use]
    pub const fn cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    #[must_use]
    pub const fn input_limit(mut self, limit: usize) -> Self {
        self.input_limit = limit;
        self
    }

    #[must_use]
    pub const fn max_password_len(mut self, len: usize) -> Self {
        self.max_password_len = len;
        self
    }

    /// Load a policy from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(json)
            .map_err(|e| PeppermillError::InvalidPolicy(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_COST..=MAX_COST).contains(&self.cost) {
            return Err(PeppermillError::InvalidPolicy(format!(
                "cost {} outside {MIN_COST}..={MAX_COST}",
                self.cost
            )));
        }

        if self.input_limit == 0 || self.input_limit > BCRYPT_INPUT_LIMIT {
            return Err(PeppermillError::InvalidPolicy(format!(
                "input limit {} outside 1..={BCRYPT_INPUT_LIMIT}",
                self.input_limit
            )));
        }

        if self.max_password_len == 0 || self.max_password_len >= self.input_limit {
            return Err(PeppermillError::InvalidPolicy(format!(
                "max password length {} leaves no room for a pepper within {} bytes",
                self.max_password_len, self.input_limit
            )));
        }

        Ok(())
    }

    /// Highest cost a stored hash may carry and still be verified. Anything
    /// above it is treated as a malformed hash.
    pub fn max_stored_cost(&self) -> u32 {
        (self.cost.max(DEFAULT_COST) + STORED_COST_HEADROOM).min(MAX_COST)
    }

    /// Check password and pepper lengths against this policy.
    pub fn check_lengths(&self, password: &[u8], pepper: &[u8]) -> Result<()> {
        if password.is_empty() {
            return Err(PeppermillError::EmptyInput("password"));
        }
        if pepper.is_empty() {
            return Err(PeppermillError::EmptyInput("pepper"));
        }
        if password.len() > self.max_password_len {
            return Err(PeppermillError::InputTooLong {
                field: "password",
                len: password.len(),
                max: self.max_password_len,
            });
        }

        let total = password.len() + pepper.len();
        if total > self.input_limit {
            return Err(PeppermillError::InputTooLong {
                field: "password and pepper",
                len: total,
                max: self.input_limit,
            });
        }

        Ok(())
    }
}
