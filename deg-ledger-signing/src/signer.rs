//! ed25519 Authorization header generation

use crate::{AuthorizationHeader, Result, SigningError};
use base64::{Engine, engine::general_purpose::STANDARD};
use blake2::{Blake2b512, Digest};
use ed25519_dalek::{SECRET_KEY_LENGTH, Signer as _, SigningKey, VerifyingKey};
use std::fmt;
use std::time::Duration;
use tracing::trace;

/// Length in bytes of the ed25519 seed expected in the signing key
pub const SEED_LENGTH: usize = SECRET_KEY_LENGTH;

/// Validity window applied when the configured value is zero or negative
pub const DEFAULT_VALIDITY_SECS: i64 = 30;

/// Signs ledger request bodies on behalf of one network participant.
///
/// The signer is immutable once built. Every call reads the clock again, so a
/// single instance can be shared across any number of delivery tasks.
#[derive(Clone)]
pub struct Signer {
    subscriber_id: String,
    unique_key_id: String,
    signing_key: SigningKey,
    validity_secs: i64,
}

impl Signer {
    /// Create a signer from a base64-encoded (standard, padded) ed25519 seed.
    ///
    /// A `validity_secs` of zero or less falls back to
    /// [`DEFAULT_VALIDITY_SECS`].
    pub fn new(
        subscriber_id: impl Into<String>,
        unique_key_id: impl Into<String>,
        signing_key_base64: &str,
        validity_secs: i64,
    ) -> Result<Self> {
        let subscriber_id = subscriber_id.into();
        let unique_key_id = unique_key_id.into();

        if subscriber_id.is_empty() {
            return Err(SigningError::Config(
                "subscriberID is required for signing".to_string(),
            ));
        }
        if unique_key_id.is_empty() {
            return Err(SigningError::Config(
                "uniqueKeyID is required for signing".to_string(),
            ));
        }
        if signing_key_base64.is_empty() {
            return Err(SigningError::Config(
                "signingPrivateKey is required for signing".to_string(),
            ));
        }

        let key_bytes = STANDARD.decode(signing_key_base64).map_err(|e| {
            SigningError::Config(format!("failed to decode signing private key: {}", e))
        })?;

        let seed: [u8; SEED_LENGTH] = key_bytes.as_slice().try_into().map_err(|_| {
            SigningError::Config(format!(
                "invalid signing private key length: expected {} bytes, got {}",
                SEED_LENGTH,
                key_bytes.len()
            ))
        })?;

        let validity_secs = if validity_secs <= 0 {
            DEFAULT_VALIDITY_SECS
        } else {
            validity_secs
        };

        Ok(Self {
            subscriber_id,
            unique_key_id,
            signing_key: SigningKey::from_bytes(&seed),
            validity_secs,
        })
    }

    /// Generate the `Authorization` header value for `payload`, stamped with
    /// the current time.
    pub fn generate_header(&self, payload: &[u8]) -> Result<String> {
        let created = chrono::Utc::now().timestamp();
        Ok(self.generate_header_at(payload, created)?.to_string())
    }

    /// Generate a header with an explicit creation timestamp (UNIX seconds).
    pub fn generate_header_at(&self, payload: &[u8], created: i64) -> Result<AuthorizationHeader> {
        let expires = created.checked_add(self.validity_secs).ok_or_else(|| {
            SigningError::Sign(format!("expiry overflows for created timestamp {}", created))
        })?;
        let message = signing_string(payload, created, expires);

        let signature = self
            .signing_key
            .try_sign(message.as_bytes())
            .map_err(|e| SigningError::Sign(e.to_string()))?;

        trace!(
            key_id = %self.key_id(),
            created,
            expires,
            "Signed ledger payload"
        );

        Ok(AuthorizationHeader::new(
            self.subscriber_id.clone(),
            self.unique_key_id.clone(),
            created,
            expires,
            signature,
        ))
    }

    /// The `<subscriberID>|<uniqueKeyID>|ed25519` key identifier
    pub fn key_id(&self) -> String {
        format!(
            "{}|{}|{}",
            self.subscriber_id,
            self.unique_key_id,
            crate::ALGORITHM
        )
    }

    /// Subscriber ID placed in the header
    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    /// Unique key ID placed in the header
    pub fn unique_key_id(&self) -> &str {
        &self.unique_key_id
    }

    /// Effective validity window
    pub fn validity(&self) -> Duration {
        Duration::from_secs(self.validity_secs.unsigned_abs())
    }

    /// Public half of the signing key, as registered with the verifier
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("subscriber_id", &self.subscriber_id)
            .field("unique_key_id", &self.unique_key_id)
            .field("signing_key", &"<redacted>")
            .field("validity_secs", &self.validity_secs)
            .finish()
    }
}

/// Build the canonical string covered by the signature.
///
/// Format: `(created): <ts>\n(expires): <ts>\ndigest: BLAKE-512=<base64>`
pub fn signing_string(payload: &[u8], created: i64, expires: i64) -> String {
    let digest = STANDARD.encode(Blake2b512::digest(payload));
    format!(
        "(created): {}\n(expires): {}\ndigest: BLAKE-512={}",
        created, expires, digest
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_b64() -> String {
        STANDARD.encode([7u8; SEED_LENGTH])
    }

    fn test_signer(validity: i64) -> Signer {
        Signer::new("bap.example.org", "key-1", &seed_b64(), validity).unwrap()
    }

    #[test]
    fn test_expiry_overflow_is_error() {
        let signer = test_signer(30);
        let err = signer.generate_header_at(b"x", i64::MAX - 5).unwrap_err();
        assert!(matches!(err, SigningError::Sign(_)));

        assert!(signer.generate_header_at(b"x", i64::MAX - 30).is_ok());
    }

    #[test]
    fn test_header_format() {
        let signer = test_signer(30);
        let header = signer.generate_header_at(b"{}", 1_700_000_000).unwrap();
        let rendered = header.to_string();

        assert!(rendered.starts_with(
            "Signature keyId=\"bap.example.org|key-1|ed25519\",algorithm=\"ed25519\",\
             created=\"1700000000\",expires=\"1700000030\",\
             headers=\"(created) (expires) digest\",signature=\""
        ));
        assert!(rendered.ends_with('"'));
    }

    #[test]
    fn test_expires_is_created_plus_validity() {
        let signer = test_signer(120);
        let header = signer.generate_header_at(b"payload", 1000).unwrap();
        assert_eq!(header.created(), 1000);
        assert_eq!(header.expires(), 1120);
    }

    #[test]
    fn test_non_positive_validity_uses_default() {
        assert_eq!(test_signer(0).validity(), Duration::from_secs(30));
        assert_eq!(test_signer(-5).validity(), Duration::from_secs(30));

        let header = test_signer(0).generate_header_at(b"x", 50).unwrap();
        assert_eq!(header.expires() - header.created(), DEFAULT_VALIDITY_SECS);
    }

    #[test]
    fn test_signing_string_layout() {
        let s = signing_string(b"", 1, 31);
        let lines: Vec<&str> = s.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "(created): 1");
        assert_eq!(lines[1], "(expires): 31");
        assert!(lines[2].starts_with("digest: BLAKE-512="));
        assert!(!s.ends_with('\n'));

        // 64-byte digest encodes to 88 padded base64 characters
        let digest = lines[2].trim_start_matches("digest: BLAKE-512=");
        assert_eq!(digest.len(), 88);
        assert_eq!(STANDARD.decode(digest).unwrap().len(), 64);
    }

    #[test]
    fn test_signature_is_deterministic() {
        let signer = test_signer(30);
        let a = signer.generate_header_at(b"same", 42).unwrap();
        let b = signer.generate_header_at(b"same", 42).unwrap();
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_timestamp_changes_signature() {
        let signer = test_signer(30);
        let a = signer.generate_header_at(b"same", 42).unwrap();
        let b = signer.generate_header_at(b"same", 43).unwrap();
        assert_ne!(a.signature_base64(), b.signature_base64());
    }

    #[test]
    fn test_payload_byte_changes_signature() {
        let signer = test_signer(30);
        let a = signer.generate_header_at(b"payload-a", 42).unwrap();
        let b = signer.generate_header_at(b"payload-b", 42).unwrap();
        assert_ne!(a.signature_base64(), b.signature_base64());
        assert_ne!(
            signing_string(b"payload-a", 42, 72),
            signing_string(b"payload-b", 42, 72)
        );
    }

    #[test]
    fn test_empty_identity_rejected() {
        let err = Signer::new("", "key-1", &seed_b64(), 30).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("subscriberID"));

        let err = Signer::new("bap", "", &seed_b64(), 30).unwrap_err();
        assert!(err.to_string().contains("uniqueKeyID"));

        let err = Signer::new("bap", "key-1", "", 30).unwrap_err();
        assert!(err.to_string().contains("signingPrivateKey"));
    }

    #[test]
    fn test_wrong_seed_length_rejected() {
        let short = STANDARD.encode([1u8; 16]);
        let err = Signer::new("bap", "key-1", &short, 30).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("expected 32 bytes, got 16"));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let err = Signer::new("bap", "key-1", "not base64!!", 30).unwrap_err();
        assert!(err.to_string().contains("failed to decode"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", test_signer(30));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("bap.example.org"));
    }

    #[test]
    fn test_key_id() {
        assert_eq!(test_signer(30).key_id(), "bap.example.org|key-1|ed25519");
    }
}
