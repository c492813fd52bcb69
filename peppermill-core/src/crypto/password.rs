//! Peppered password hashing with bcrypt.
//!
//! The pepper is appended to the password before hashing. bcrypt only reads
//! the first 72 bytes of its input, so the combined length is checked up
//! front instead of letting the primitive drop the tail of the pepper.

use crate::crypto::entropy::{EntropySource, OsEntropy};
use crate::error::{PeppermillError, Result};
use crate::policy::{PasswordPolicy, MIN_COST};
use bcrypt::{HashParts, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

/// Salt length bcrypt expects.
pub const BCRYPT_SALT_LEN: usize = 16;

/// A stored bcrypt hash in modular crypt format (`$2b$12$...`).
///
/// The string embeds its own cost and salt, so it is all a credential store
/// needs to keep alongside the user record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        std::str::from_utf8(bytes)
            .map_err(|_| PeppermillError::MalformedHash)?
            .parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Work factor recorded in the hash.
    pub fn cost(&self) -> u32 {
        parse_parts(&self.0).map_or(0, |parts| parts.get_cost())
    }
}

/// Parse a hash in the exact form [`PasswordHasher::hash`] emits.
///
/// bcrypt itself also accepts `$2a$`, `$2x$` and `$2y$` prefixes and loose
/// cost spellings, so anything that does not re-encode to the same `$2b$`
/// string is rejected.
fn parse_parts(encoded: &str) -> Result<HashParts> {
    let parts = HashParts::from_str(encoded).map_err(|_| PeppermillError::MalformedHash)?;
    if parts.format_for_version(Version::TwoB) != encoded {
        return Err(PeppermillError::MalformedHash);
    }
    Ok(parts)
}

impl FromStr for PasswordHash {
    type Err = PeppermillError;

    fn from_str(s: &str) -> Result<Self> {
        parse_parts(s)?;
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for PasswordHash {
    type Error = PeppermillError;

    fn try_from(value: String) -> Result<Self> {
        parse_parts(&value)?;
        Ok(Self(value))
    }
}

impl From<PasswordHash> for String {
    fn from(hash: PasswordHash) -> Self {
        hash.0
    }
}

impl AsRef<[u8]> for PasswordHash {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PasswordHash").field(&self.0).finish()
    }
}

/// `password || pepper` in a buffer that is wiped on drop.
fn peppered(password: &[u8], pepper: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut input = Zeroizing::new(Vec::with_capacity(password.len() + pepper.len()));
    input.extend_from_slice(password);
    input.extend_from_slice(pepper);
    input
}

/// Password hasher bound to a policy and a salt source.
#[derive(Clone)]
pub struct PasswordHasher {
    policy: PasswordPolicy,
    entropy: Arc<dyn EntropySource>,
}

impl PasswordHasher {
    /// Hasher drawing salts from the operating system.
    pub fn new(policy: PasswordPolicy) -> Result<Self> {
        Self::with_entropy(policy, Arc::new(OsEntropy))
    }

    pub fn with_entropy(policy: PasswordPolicy, entropy: Arc<dyn EntropySource>) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy, entropy })
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Hash `password` with `pepper` appended.
    ///
    /// # Errors
    ///
    /// `EmptyInput` for an empty password or pepper, `InputTooLong` when the
    /// password exceeds the policy limit or the pair exceeds the primitive's
    /// input window, `EntropyUnavailable` if no salt could be drawn.
    pub fn hash(&self, password: &[u8], pepper: &[u8]) -> Result<PasswordHash> {
        self.policy.check_lengths(password, pepper)?;

        let mut salt = [0u8; BCRYPT_SALT_LEN];
        self.entropy.fill_exact(&mut salt)?;

        let input = peppered(password, pepper);
        let parts = bcrypt::hash_with_salt(input.as_slice(), self.policy.cost, salt)
            .map_err(|e| PeppermillError::HashFailure(e.to_string()))?;

        debug!(cost = self.policy.cost, "password hashed");
        Ok(PasswordHash(parts.format_for_version(Version::TwoB)))
    }

    /// Returns `true` only if `password` and `pepper` reproduce `hash`.
    ///
    /// Never errors: empty or oversized input and unparsable hashes all
    /// count as a failed match.
    pub fn verify(&self, password: &[u8], pepper: &[u8], hash: &[u8]) -> bool {
        match self.verify_checked(password, pepper, hash) {
            Ok(matched) => matched,
            Err(err) => {
                debug!(reason = %err, "password verification rejected input");
                false
            }
        }
    }

    /// Like [`verify`](Self::verify) but reports why input was rejected.
    ///
    /// `Ok(false)` means the inputs were well formed and did not match. A
    /// hash whose cost lies outside `MIN_COST..=policy.max_stored_cost()`
    /// is `MalformedHash`.
    pub fn verify_checked(&self, password: &[u8], pepper: &[u8], hash: &[u8]) -> Result<bool> {
        self.policy.check_lengths(password, pepper)?;

        let encoded = std::str::from_utf8(hash).map_err(|_| PeppermillError::MalformedHash)?;
        let cost = parse_parts(encoded)?.get_cost();
        if !(MIN_COST..=self.policy.max_stored_cost()).contains(&cost) {
            debug!(cost, "stored hash cost out of range");
            return Err(PeppermillError::MalformedHash);
        }
        let input = peppered(password, pepper);

        // bcrypt compares the recomputed digest in constant time.
        bcrypt::verify(input.as_slice(), encoded).map_err(|_| PeppermillError::MalformedHash)
    }

    /// Whether `hash` should be recomputed under the current policy, e.g.
    /// after the cost was raised. Unparsable hashes always need it.
    pub fn needs_rehash(&self, hash: &[u8]) -> bool {
        match PasswordHash::from_bytes(hash) {
            Ok(parsed) => parsed.cost() != self.policy.cost,
            Err(_) => true,
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            policy: PasswordPolicy::default(),
            entropy: Arc::new(OsEntropy),
        }
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Hash with the default policy (cost 12).
pub fn hash(password: &[u8], pepper: &[u8]) -> Result<PasswordHash> {
    PasswordHasher::default().hash(password, pepper)
}

/// Verify with the default policy.
pub fn verify(password: &[u8], pepper: &[u8], hash: &[u8]) -> bool {
    PasswordHasher::default().verify(password, pepper, hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::entropy::RngEntropy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const PEPPER: &[u8] = b"0123456789abcdef";

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(PasswordPolicy::new().cost(4)).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash(b"random password here", PEPPER).unwrap();

        assert!(hash.as_str().starts_with("$2b$04$"));
        assert_eq!(hash.as_bytes().len(), 60);
        assert!(hasher.verify(b"random password here", PEPPER, hash.as_bytes()));
        assert!(!hasher.verify(b"random password herE", PEPPER, hash.as_bytes()));
    }

    #[test]
    fn test_pepper_is_part_of_hash() {
        let hasher = fast_hasher();
        let hash = hasher.hash(b"password", PEPPER).unwrap();

        assert!(!hasher.verify(b"password", b"0123456789abcdeF", hash.as_bytes()));
        // The pepper is appended, not merely concatenated in any order.
        assert!(!hasher.verify(PEPPER, b"password", hash.as_bytes()));
    }

    #[test]
    fn test_same_password_different_salts() {
        let hasher = fast_hasher();
        let a = hasher.hash(b"password", PEPPER).unwrap();
        let b = hasher.hash(b"password", PEPPER).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_deterministic_salt_source() {
        let policy = PasswordPolicy::new().cost(4);
        let a = PasswordHasher::with_entropy(
            policy.clone(),
            Arc::new(RngEntropy::new(StdRng::seed_from_u64(1))),
        )
        .unwrap();
        let b = PasswordHasher::with_entropy(
            policy,
            Arc::new(RngEntropy::new(StdRng::seed_from_u64(1))),
        )
        .unwrap();

        assert_eq!(
            a.hash(b"password", PEPPER).unwrap(),
            b.hash(b"password", PEPPER).unwrap()
        );
    }

    #[test]
    fn test_empty_password() {
        let hasher = fast_hasher();
        assert_eq!(
            hasher.hash(b"", PEPPER),
            Err(PeppermillError::EmptyInput("password"))
        );

        let hash = hasher.hash(b"password", PEPPER).unwrap();
        assert!(!hasher.verify(b"", PEPPER, hash.as_bytes()));
        assert_eq!(
            hasher.verify_checked(b"", PEPPER, hash.as_bytes()),
            Err(PeppermillError::EmptyInput("password"))
        );
    }

    #[test]
    fn test_empty_pepper() {
        let hasher = fast_hasher();
        assert_eq!(
            hasher.hash(b"password", b""),
            Err(PeppermillError::EmptyInput("pepper"))
        );
    }

    #[test]
    fn test_length_boundary() {
        let hasher = fast_hasher();
        let max = hasher.policy().max_password_len;

        let at_limit = vec![b'x'; max];
        let hash = hasher.hash(&at_limit, PEPPER).unwrap();
        assert!(hasher.verify(&at_limit, PEPPER, hash.as_bytes()));

        let over = vec![b'x'; max + 1];
        assert!(matches!(
            hasher.hash(&over, PEPPER),
            Err(PeppermillError::InputTooLong { field: "password", .. })
        ));
        assert!(!hasher.verify(&over, PEPPER, hash.as_bytes()));
        assert!(matches!(
            hasher.verify_checked(&over, PEPPER, hash.as_bytes()),
            Err(PeppermillError::InputTooLong { .. })
        ));
    }

    #[test]
    fn test_last_pepper_byte_counts() {
        // Fill the whole 72-byte window so the final byte is the one bcrypt
        // would be most tempted to drop.
        let hasher = fast_hasher();
        let password = vec![b'p'; 56];
        let mut pepper = [7u8; 16];

        let hash = hasher.hash(&password, &pepper).unwrap();
        pepper[15] ^= 0xFF;
        assert!(!hasher.verify(&password, &pepper, hash.as_bytes()));
    }

    #[test]
    fn test_malformed_hash() {
        let hasher = fast_hasher();
        assert!(!hasher.verify(b"password", PEPPER, b"not a bcrypt hash"));
        assert_eq!(
            hasher.verify_checked(b"password", PEPPER, b"not a bcrypt hash"),
            Err(PeppermillError::MalformedHash)
        );
        assert_eq!(
            hasher.verify_checked(b"password", PEPPER, &[0xFF, 0xFE]),
            Err(PeppermillError::MalformedHash)
        );
    }

    #[test]
    fn test_mismatch_is_not_an_error() {
        let hasher = fast_hasher();
        let hash = hasher.hash(b"password", PEPPER).unwrap();
        assert_eq!(
            hasher.verify_checked(b"passw0rd", PEPPER, hash.as_bytes()),
            Ok(false)
        );
        assert_eq!(
            hasher.verify_checked(b"password", PEPPER, hash.as_bytes()),
            Ok(true)
        );
    }

    #[test]
    fn test_needs_rehash() {
        let hasher = fast_hasher();
        let hash = hasher.hash(b"password", PEPPER).unwrap();
        assert_eq!(hash.cost(), 4);
        assert!(!hasher.needs_rehash(hash.as_bytes()));

        let stronger = PasswordHasher::new(PasswordPolicy::new().cost(5)).unwrap();
        assert!(stronger.needs_rehash(hash.as_bytes()));
        assert!(stronger.needs_rehash(b"garbage"));
    }

    #[test]
    fn test_invalid_policy_rejected() {
        assert!(matches!(
            PasswordHasher::new(PasswordPolicy::new().cost(2)),
            Err(PeppermillError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_hash_serde() {
        let hasher = fast_hasher();
        let hash = hasher.hash(b"password", PEPPER).unwrap();

        let json = serde_json::to_string(&hash).unwrap();
        let back: PasswordHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, back);

        assert!(serde_json::from_str::<PasswordHash>(r#""$2b$nope""#).is_err());
    }

    #[test]
    fn test_other_bcrypt_versions_rejected() {
        let hasher = fast_hasher();
        let hash = hasher.hash(b"password", PEPPER).unwrap();

        for version in ["2a", "2x", "2y"] {
            let relabeled = hash.as_str().replacen("2b", version, 1);
            assert!(!hasher.verify(b"password", PEPPER, relabeled.as_bytes()));
            assert_eq!(
                hasher.verify_checked(b"password", PEPPER, relabeled.as_bytes()),
                Err(PeppermillError::MalformedHash)
            );
            assert!(relabeled.parse::<PasswordHash>().is_err());
        }
    }

    #[test]
    fn test_loose_cost_spelling_rejected() {
        let hasher = fast_hasher();
        let hash = hasher.hash(b"password", PEPPER).unwrap();
        let loose = hash.as_str().replacen("$04$", "$+4$", 1);
        assert_eq!(
            hasher.verify_checked(b"password", PEPPER, loose.as_bytes()),
            Err(PeppermillError::MalformedHash)
        );
    }

    #[test]
    fn test_excessive_stored_cost_rejected() {
        let hasher = fast_hasher();
        let hash = hasher.hash(b"password", PEPPER).unwrap();

        // Must fail on the header alone; running cost 31 would take hours.
        let expensive = hash.as_str().replacen("$04$", "$31$", 1);
        assert!(!hasher.verify(b"password", PEPPER, expensive.as_bytes()));
        assert_eq!(
            hasher.verify_checked(b"password", PEPPER, expensive.as_bytes()),
            Err(PeppermillError::MalformedHash)
        );

        let below_minimum = hash.as_str().replacen("$04$", "$03$", 1);
        assert_eq!(
            hasher.verify_checked(b"password", PEPPER, below_minimum.as_bytes()),
            Err(PeppermillError::MalformedHash)
        );
    }

    #[test]
    fn test_stored_cost_within_headroom_verifies() {
        let stronger = PasswordHasher::new(PasswordPolicy::new().cost(5)).unwrap();
        let hash = stronger.hash(b"password", PEPPER).unwrap();
        assert!(fast_hasher().verify(b"password", PEPPER, hash.as_bytes()));
    }
}
