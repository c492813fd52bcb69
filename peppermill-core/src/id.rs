//! Random identifiers

use crate::crypto::entropy::{EntropySource, OsEntropy};
use crate::error::{PeppermillError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const RANDOM_ID_LEN: usize = 16;

/// 128 random bits. Unlike an RFC 4122 UUID there are no version bits and no
/// separators; it displays as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RandomId([u8; RANDOM_ID_LEN]);

impl RandomId {
    pub fn generate(source: &dyn EntropySource) -> Result<Self> {
        let mut bytes = [0u8; RANDOM_ID_LEN];
        source.fill_exact(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn new_random() -> Result<Self> {
        Self::generate(&OsEntropy)
    }

    pub fn as_bytes(&self) -> &[u8; RANDOM_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for RandomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for RandomId {
    type Err = PeppermillError;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; RANDOM_ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| PeppermillError::InvalidEncoding)?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for RandomId {
    type Error = PeppermillError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RandomId> for String {
    fn from(id: RandomId) -> Self {
        id.to_string()
    }
}
