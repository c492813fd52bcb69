//! HMAC-SHA256 message authentication
//!
//! The key is symmetric: anyone able to verify a tag can also forge one.
//! Tags prove integrity and origin only to holders of the shared key, never
//! to third parties.

use crate::crypto::ct::ct_eq;
use crate::crypto::keys::SecretKey;
use crate::error::{PeppermillError, Result};
use hmac::digest::{generic_array::GenericArray, KeyInit};
use hmac::{Hmac, Mac as _};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Size in bytes of a [`Mac`].
pub const MAC_LEN: usize = 32;

/// An HMAC-SHA256 authentication tag.
#[derive(Clone, Copy, Eq)]
pub struct Mac([u8; MAC_LEN]);

impl Mac {
    pub const fn from_bytes(bytes: [u8; MAC_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MAC_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(encoded: &str) -> Result<Self> {
        let mut array = [0u8; MAC_LEN];
        hex::decode_to_slice(encoded.trim(), &mut array)
            .map_err(|_| PeppermillError::InvalidEncoding)?;
        Ok(Self(array))
    }
}

impl PartialEq for Mac {
    fn eq(&self, other: &Self) -> bool {
        ct_eq(&self.0, &other.0)
    }
}

impl AsRef<[u8]> for Mac {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mac({})", self.to_hex())
    }
}

fn keyed(key: &SecretKey) -> HmacSha256 {
    // A 64-byte key is exactly one SHA-256 block, HMAC's native key size.
    <HmacSha256 as KeyInit>::new(GenericArray::from_slice(key.as_bytes()))
}

/// Compute HMAC-SHA256(key, message).
pub fn sign(key: &SecretKey, message: &[u8]) -> Mac {
    let mut mac = keyed(key);
    mac.update(message);
    Mac(mac.finalize().into_bytes().into())
}

/// Check `tag` against a fresh tag for `message`.
///
/// Runs the comparison in constant time. A tag of the wrong length is
/// reported as `false`, never as an error.
pub fn verify(key: &SecretKey, message: &[u8], tag: &[u8]) -> bool {
    let expected = sign(key, message);
    ct_eq(expected.as_bytes(), tag)
}

impl SecretKey {
    pub fn sign(&self, message: &[u8]) -> Mac {
        sign(self, message)
    }

    pub fn verify(&self, message: &[u8], tag: &[u8]) -> bool {
        verify(self, message, tag)
    }
}
