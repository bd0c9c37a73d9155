// Recorder configuration parsed from the plugin's string map

use crate::env::{ENV_SIGNING_PRIVATE_KEY, ENV_SUBSCRIBER_ID, ENV_UNIQUE_KEY_ID, EnvSnapshot};
use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default asynchronous delivery timeout
pub const DEFAULT_ASYNC_TIMEOUT: Duration = Duration::from_secs(5);
/// Default header carrying the static API key
pub const DEFAULT_AUTH_HEADER: &str = "X-API-Key";
/// Default signature validity in seconds
pub const DEFAULT_SIGNATURE_VALIDITY_SECS: i64 = 30;

/// Ledger role of this platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Buyer,
    Seller,
    BuyerDiscom,
    SellerDiscom,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "BUYER",
            Self::Seller => "SELLER",
            Self::BuyerDiscom => "BUYER_DISCOM",
            Self::SellerDiscom => "SELLER_DISCOM",
        }
    }

    /// Distribution companies are the only roles allowed to record actuals
    pub fn is_discom(&self) -> bool {
        matches!(self, Self::BuyerDiscom | Self::SellerDiscom)
    }

    pub fn is_buyer_side(&self) -> bool {
        matches!(self, Self::Buyer | Self::BuyerDiscom)
    }
}

impl FromStr for Role {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BUYER" => Ok(Self::Buyer),
            "SELLER" => Ok(Self::Seller),
            "BUYER_DISCOM" => Ok(Self::BuyerDiscom),
            "SELLER_DISCOM" => Ok(Self::SellerDiscom),
            other => Err(ConfigError::invalid(
                "role",
                format!(
                    "{} (must be BUYER, SELLER, BUYER_DISCOM, or SELLER_DISCOM)",
                    other
                ),
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Beckn callback actions that trigger ledger recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Trade records, sent to `/ledger/put`
    OnConfirm,
    /// Meter readings, sent to `/ledger/record`
    OnStatus,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnConfirm => "on_confirm",
            Self::OnStatus => "on_status",
        }
    }
}

impl FromStr for Action {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "on_confirm" => Ok(Self::OnConfirm),
            "on_status" => Ok(Self::OnStatus),
            other => Err(ConfigError::invalid(
                "action",
                format!("{} (must be on_confirm or on_status)", other),
            )),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the signing identity was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningSource {
    ExplicitConfig,
    Environment,
}

/// Complete recorder configuration
#[derive(Clone)]
pub struct RecorderConfig {
    /// Base URL of the ledger service
    pub ledger_host: String,
    pub role: Role,
    pub actions: Vec<Action>,
    pub enabled: bool,
    /// Deadline for one asynchronous delivery, including client retries
    pub async_timeout: Duration,
    /// Retries after the first attempt (0 = single attempt)
    pub retry_count: u32,
    pub api_key: String,
    pub auth_header: String,
    pub debug_logging: bool,

    pub signing_private_key: String,
    pub subscriber_id: String,
    pub unique_key_id: String,
    pub signature_validity_secs: i64,
    /// At least one signing field came from the environment snapshot
    pub signing_from_env: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            ledger_host: String::new(),
            role: Role::Buyer,
            actions: vec![Action::OnConfirm],
            enabled: true,
            async_timeout: DEFAULT_ASYNC_TIMEOUT,
            retry_count: 0,
            api_key: String::new(),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
            debug_logging: false,
            signing_private_key: String::new(),
            subscriber_id: String::new(),
            unique_key_id: String::new(),
            signature_validity_secs: DEFAULT_SIGNATURE_VALIDITY_SECS,
            signing_from_env: false,
        }
    }
}

impl RecorderConfig {
    /// Parse the plugin configuration map.
    ///
    /// Explicit keys win; signing fields left empty fall back to `env`.
    pub fn parse(cfg: &HashMap<String, String>, env: &EnvSnapshot) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = non_empty(cfg, "ledgerHost") {
            config.ledger_host = host.to_string();
        }
        if config.ledger_host.is_empty() {
            return Err(ConfigError::Required("ledgerHost"));
        }

        if let Some(role) = non_empty(cfg, "role") {
            config.role = role.parse()?;
        }

        if let Some(actions) = non_empty(cfg, "actions") {
            config.actions = actions
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::parse)
                .collect::<Result<Vec<Action>>>()?;
        }

        if let Some(enabled) = cfg.get("enabled") {
            config.enabled = parse_bool(enabled);
        }

        if let Some(timeout) = non_empty(cfg, "asyncTimeout") {
            let ms: u64 = timeout
                .parse()
                .map_err(|_| ConfigError::invalid("asyncTimeout", timeout))?;
            if ms == 0 {
                return Err(ConfigError::invalid(
                    "asyncTimeout",
                    "must be greater than zero",
                ));
            }
            config.async_timeout = Duration::from_millis(ms);
        }

        if let Some(retry) = non_empty(cfg, "retryCount") {
            config.retry_count = retry
                .parse()
                .map_err(|_| ConfigError::invalid("retryCount", retry))?;
        }

        if let Some(api_key) = cfg.get("apiKey") {
            config.api_key = api_key.clone();
        }
        if let Some(header) = non_empty(cfg, "authHeader") {
            config.auth_header = header.to_string();
        }
        if let Some(debug) = cfg.get("debugLogging") {
            config.debug_logging = parse_bool(debug);
        }

        // Aliases follow the Beckn key manager naming
        if let Some(key) = non_empty(cfg, "signingPrivateKey") {
            config.signing_private_key = key.to_string();
        }
        if let Some(id) = non_empty(cfg, "subscriberId").or_else(|| non_empty(cfg, "networkParticipant"))
        {
            config.subscriber_id = id.to_string();
        }
        if let Some(id) = non_empty(cfg, "uniqueKeyId").or_else(|| non_empty(cfg, "keyId")) {
            config.unique_key_id = id.to_string();
        }

        if let Some(validity) = non_empty(cfg, "signatureValiditySeconds") {
            config.signature_validity_secs = validity
                .parse()
                .map_err(|_| ConfigError::invalid("signatureValiditySeconds", validity))?;
        }

        config.apply_env(env);
        config.validate_signing()?;

        Ok(config)
    }

    fn apply_env(&mut self, env: &EnvSnapshot) {
        let fallbacks = [
            (&mut self.signing_private_key, env.signing_private_key()),
            (&mut self.subscriber_id, env.subscriber_id()),
            (&mut self.unique_key_id, env.unique_key_id()),
        ];

        let mut from_env = false;
        for (field, value) in fallbacks {
            if field.is_empty()
                && let Some(value) = value
            {
                *field = value.to_string();
                from_env = true;
            }
        }
        self.signing_from_env = from_env;
    }

    /// If any signing field is set, all three must be.
    fn validate_signing(&self) -> Result<()> {
        if !self.signing_requested() {
            return Ok(());
        }

        let required = [
            (&self.signing_private_key, "signingPrivateKey", ENV_SIGNING_PRIVATE_KEY),
            (&self.subscriber_id, "subscriberId", ENV_SUBSCRIBER_ID),
            (&self.unique_key_id, "uniqueKeyId", ENV_UNIQUE_KEY_ID),
        ];

        for (value, field, env_var) in required {
            if value.is_empty() {
                return Err(ConfigError::MissingField { field, env_var });
            }
        }
        Ok(())
    }

    fn signing_requested(&self) -> bool {
        !self.signing_private_key.is_empty()
            || !self.subscriber_id.is_empty()
            || !self.unique_key_id.is_empty()
    }

    /// All three signing fields are present
    pub fn signing_configured(&self) -> bool {
        !self.signing_private_key.is_empty()
            && !self.subscriber_id.is_empty()
            && !self.unique_key_id.is_empty()
    }

    pub fn signing_source(&self) -> Option<SigningSource> {
        if !self.signing_configured() {
            None
        } else if self.signing_from_env {
            Some(SigningSource::Environment)
        } else {
            Some(SigningSource::ExplicitConfig)
        }
    }

    pub fn is_action_enabled(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    /// API key, if one is configured
    pub fn api_key(&self) -> Option<&str> {
        Some(self.api_key.as_str()).filter(|k| !k.is_empty())
    }
}

impl fmt::Debug for RecorderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &str| if s.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("RecorderConfig")
            .field("ledger_host", &self.ledger_host)
            .field("role", &self.role)
            .field("actions", &self.actions)
            .field("enabled", &self.enabled)
            .field("async_timeout", &self.async_timeout)
            .field("retry_count", &self.retry_count)
            .field("api_key", &redact(&self.api_key))
            .field("auth_header", &self.auth_header)
            .field("debug_logging", &self.debug_logging)
            .field("signing_private_key", &redact(&self.signing_private_key))
            .field("subscriber_id", &self.subscriber_id)
            .field("unique_key_id", &self.unique_key_id)
            .field("signature_validity_secs", &self.signature_validity_secs)
            .field("signing_from_env", &self.signing_from_env)
            .finish()
    }
}

fn non_empty<'a>(cfg: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    cfg.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> bool {
    value == "true" || value == "1"
}
