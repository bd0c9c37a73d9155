// Signing environment snapshot
//
// The three signing variables are read exactly once, at startup, and handed to
// `RecorderConfig::parse`. Nothing else in the workspace touches the process
// environment.

use crate::{ConfigError, Result};
use std::fmt;
use std::path::Path;

/// Base64 ed25519 seed, shared with the Beckn key manager
pub const ENV_SIGNING_PRIVATE_KEY: &str = "SIGNING_PRIVATE_KEY";
/// Subscriber ID used in the header keyId
pub const ENV_SUBSCRIBER_ID: &str = "SUBSCRIBER_ID";
/// Unique key ID used in the header keyId
pub const ENV_UNIQUE_KEY_ID: &str = "UNIQUE_KEY_ID";

const SIGNING_VARS: [&str; 3] = [ENV_SIGNING_PRIVATE_KEY, ENV_SUBSCRIBER_ID, ENV_UNIQUE_KEY_ID];

/// Immutable copy of the signing-related environment variables
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    signing_private_key: Option<String>,
    subscriber_id: Option<String>,
    unique_key_id: Option<String>,
}

impl EnvSnapshot {
    /// An empty snapshot, as if none of the variables were set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read the variables from the process environment
    pub fn capture() -> Self {
        Self::from_pairs(
            SIGNING_VARS
                .iter()
                .filter_map(|name| std::env::var(name).ok().map(|v| (name.to_string(), v))),
        )
    }

    /// Read the variables from a `.env` file without touching the process
    /// environment
    pub fn from_dotenv(path: impl AsRef<Path>) -> Result<Self> {
        let iter = dotenvy::from_path_iter(path.as_ref())
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;

        let mut pairs = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| ConfigError::ParseError(e.to_string()))?;
            pairs.push((key, value));
        }

        Ok(Self::from_pairs(pairs))
    }

    /// Build a snapshot from explicit name/value pairs. Unknown names and
    /// empty values are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut snapshot = Self::default();
        for (key, value) in pairs {
            let value: String = value.into();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                ENV_SIGNING_PRIVATE_KEY => snapshot.signing_private_key = Some(value),
                ENV_SUBSCRIBER_ID => snapshot.subscriber_id = Some(value),
                ENV_UNIQUE_KEY_ID => snapshot.unique_key_id = Some(value),
                _ => {}
            }
        }
        snapshot
    }

    pub fn signing_private_key(&self) -> Option<&str> {
        self.signing_private_key.as_deref()
    }

    pub fn subscriber_id(&self) -> Option<&str> {
        self.subscriber_id.as_deref()
    }

    pub fn unique_key_id(&self) -> Option<&str> {
        self.unique_key_id.as_deref()
    }
}

impl fmt::Debug for EnvSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvSnapshot")
            .field(
                "signing_private_key",
                &self.signing_private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("subscriber_id", &self.subscriber_id)
            .field("unique_key_id", &self.unique_key_id)
            .finish()
    }
}
