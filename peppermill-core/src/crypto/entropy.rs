//! Entropy sources for keys, salts and identifiers

use crate::error::{PeppermillError, Result};
use rand::{CryptoRng, RngCore};
use std::sync::Mutex;
use tracing::warn;
use zeroize::Zeroize;

/// Consecutive zero-length reads tolerated before a source counts as stalled.
pub const MAX_EMPTY_READS: usize = 8;

/// A cryptographically secure random byte source.
///
/// Production code uses [`OsEntropy`]. Anything else implementing this trait
/// (for example [`RngEntropy`] over a seeded generator) can stand in for it in
/// tests without touching the callers.
pub trait EntropySource: Send + Sync {
    /// Write random bytes to the front of `dest` and return how many were
    /// written. Short writes are allowed.
    fn try_fill(&self, dest: &mut [u8]) -> Result<usize>;

    /// Fill all of `dest`, retrying short reads.
    ///
    /// On failure `dest` is zeroed so callers never see partial material.
    fn fill_exact(&self, dest: &mut [u8]) -> Result<()> {
        let wanted = dest.len();
        let mut filled = 0;
        let mut empty_reads = 0;

        while filled < wanted {
            match self.try_fill(&mut dest[filled..]) {
                Ok(0) => {
                    empty_reads += 1;
                    if empty_reads >= MAX_EMPTY_READS {
                        dest.zeroize();
                        warn!(filled, wanted, "entropy source stalled");
                        return Err(PeppermillError::EntropyUnavailable);
                    }
                }
                Ok(n) => {
                    filled += n.min(wanted - filled);
                    empty_reads = 0;
                }
                Err(err) => {
                    dest.zeroize();
                    warn!(filled, wanted, error = %err, "entropy source failed");
                    return Err(err);
                }
            }
        }

        Ok(())
    }
}

/// Operating system CSPRNG (via `getrandom`).
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn try_fill(&self, dest: &mut [u8]) -> Result<usize> {
        getrandom::getrandom(dest).map_err(|_| PeppermillError::EntropyUnavailable)?;
        Ok(dest.len())
    }
}

/// Adapter exposing any `rand` CSPRNG as an [`EntropySource`].
pub struct RngEntropy<R> {
    rng: Mutex<R>,
}

impl<R: RngCore + CryptoRng + Send> RngEntropy<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl<R: RngCore + CryptoRng + Send> EntropySource for RngEntropy<R> {
    fn try_fill(&self, dest: &mut [u8]) -> Result<usize> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| PeppermillError::EntropyUnavailable)?;
        rng.try_fill_bytes(dest)
            .map_err(|_| PeppermillError::EntropyUnavailable)?;
        Ok(dest.len())
    }
}
