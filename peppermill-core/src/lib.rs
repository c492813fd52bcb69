//! Peppermill Core Library
//!
//! Peppered bcrypt password hashing and HMAC-SHA256 message authentication.

pub mod crypto;
pub mod error;
pub mod id;
pub mod policy;

// Re-exports
pub use crypto::ct::ct_eq;
pub use crypto::entropy::{EntropySource, OsEntropy, RngEntropy};
pub use crypto::keys::{new_key, SecretKey, SECRET_KEY_LEN};
pub use crypto::mac::{Mac, MAC_LEN};
pub use crypto::password::{PasswordHash, PasswordHasher};
pub use error::{PeppermillError, Result};
pub use id::RandomId;
pub use policy::PasswordPolicy;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
