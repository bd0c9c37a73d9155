//! Beckn-style request signing for the DEG ledger recorder
//!
//! Outgoing ledger calls may carry an `Authorization` header built the same
//! way a Beckn network participant signs its messages: the request body is
//! hashed with BLAKE2b-512, the digest is bound to a short validity window,
//! and the resulting string is signed with an ed25519 key derived from a
//! 32-byte seed.
//!
//! # Example
//!
//! ```rust,no_run
//! use deg_ledger_signing::Signer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let signer = Signer::new(
//!     "bap.example.org",
//!     "key-1",
//!     "MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTIzNDU2Nzg5MDE=",
//!     30,
//! )?;
//!
//! let body = br#"{"transactionId":"txn-1"}"#;
//! let header = signer.generate_header(body)?;
//! assert!(header.starts_with("Signature keyId=\"bap.example.org|key-1|ed25519\""));
//! # Ok(())
//! # }
//! ```
//!
//! # Verifying
//!
//! [`AuthorizationHeader`] parses the wire format back and checks it against
//! a payload and a public key:
//!
//! ```rust,no_run
//! use deg_ledger_signing::{AuthorizationHeader, Signer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let signer = Signer::new("bap", "k1", "MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTIzNDU2Nzg5MDE=", 30)?;
//! let body = b"payload";
//! let header: AuthorizationHeader = signer.generate_header(body)?.parse()?;
//! header.verify(body, &signer.verifying_key(), header.created())?;
//! # Ok(())
//! # }
//! ```

mod error;
mod header;
mod signer;

pub use error::SigningError;
pub use header::{ALGORITHM, AuthorizationHeader, SIGNED_HEADERS};
pub use signer::{DEFAULT_VALIDITY_SECS, SEED_LENGTH, Signer, signing_string};

/// Re-exported so verifiers do not need a direct ed25519 dependency
pub use ed25519_dalek::VerifyingKey;

/// Result type for signing operations
pub type Result<T> = std::result::Result<T, SigningError>;
