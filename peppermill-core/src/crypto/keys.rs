//! Symmetric secret key generation

use crate::crypto::ct::ct_eq;
use crate::crypto::entropy::{EntropySource, OsEntropy};
use crate::error::{PeppermillError, Result};
use std::fmt;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size in bytes of a [`SecretKey`].
pub const SECRET_KEY_LEN: usize = 64;

/// A 64-byte secret key for message authentication.
///
/// The caller owns the key for its whole lifetime; this crate never stores,
/// logs or transmits it. `Debug` output is redacted and the bytes are wiped
/// on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; SECRET_KEY_LEN]);

impl SecretKey {
    /// Draw a new key from `source`.
    ///
    /// Fails with [`PeppermillError::KeyGenerationFailure`] if the source
    /// cannot supply all 64 bytes. No partial key is ever returned.
    pub fn generate(source: &dyn EntropySource) -> Result<Self> {
        let mut bytes = Zeroizing::new([0u8; SECRET_KEY_LEN]);
        source
            .fill_exact(bytes.as_mut_slice())
            .map_err(|err| PeppermillError::KeyGenerationFailure(err.to_string()))?;

        debug!(len = SECRET_KEY_LEN, "generated secret key");
        Ok(Self(*bytes))
    }

    /// Wrap existing key material.
    pub const fn from_bytes(bytes: [u8; SECRET_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Wrap key material of unchecked length, e.g. loaded from a vault.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; SECRET_KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| PeppermillError::InvalidKeyLength {
                    expected: SECRET_KEY_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_KEY_LEN] {
        &self.0
    }

    /// Lowercase hex, for handing the key to a secret store.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }

    pub fn from_hex(encoded: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            hex::decode(encoded.trim()).map_err(|_| PeppermillError::InvalidEncoding)?,
        );
        Self::from_slice(&bytes)
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        ct_eq(&self.0, &other.0)
    }
}

impl Eq for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

/// Generate a key from the operating system CSPRNG.
pub fn new_key() -> Result<SecretKey> {
    SecretKey::generate(&OsEntropy)
}
