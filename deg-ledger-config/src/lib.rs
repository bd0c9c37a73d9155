// Configuration management for the DEG ledger recorder

pub mod env;
pub mod error;
pub mod loader;
pub mod recorder;

pub use env::{ENV_SIGNING_PRIVATE_KEY, ENV_SUBSCRIBER_ID, ENV_UNIQUE_KEY_ID, EnvSnapshot};
pub use error::{ConfigError, Result};
pub use loader::{FileFormat, load_settings, parse_settings};
pub use recorder::{
    Action, DEFAULT_ASYNC_TIMEOUT, DEFAULT_AUTH_HEADER, DEFAULT_SIGNATURE_VALIDITY_SECS,
    RecorderConfig, Role, SigningSource,
};
