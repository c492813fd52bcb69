//! Cryptographic operations for Peppermill

pub mod ct;
pub mod entropy;
pub mod keys;
pub mod mac;
pub mod password;

use crate::error::Result;
use entropy::{EntropySource, OsEntropy};
use zeroize::Zeroizing;

/// Fill buffer with cryptographically secure random bytes
pub fn secure_random(buf: &mut [u8]) -> Result<()> {
    OsEntropy.fill_exact(buf)
}

/// Generate a random pepper of `len` bytes.
///
/// Peppers are owned by the caller and must be stored apart from the
/// credential database.
pub fn generate_pepper(len: usize) -> Result<Zeroizing<Vec<u8>>> {
    let mut pepper = Zeroizing::new(vec![0u8; len]);
    secure_random(pepper.as_mut_slice())?;
    Ok(pepper)
}
