//! Request authentication for ledger calls.
//!
//! Exactly one scheme is active per client. When a signer is available it
//! always wins and the API key is never sent alongside it.

use crate::{LedgerClientError, Result};
use deg_ledger_signing::Signer;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use std::sync::Arc;

/// Active authentication scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Beckn `Signature` Authorization header, generated per request
    Signature,
    /// Static API key in a configurable header
    ApiKey,
    /// No authentication header
    None,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signature => "signature",
            Self::ApiKey => "api_key",
            Self::None => "none",
        }
    }
}

/// Resolved authentication for outgoing requests
#[derive(Debug, Clone)]
pub enum RequestAuth {
    Signature(Arc<Signer>),
    ApiKey {
        header: HeaderName,
        value: HeaderValue,
    },
    None,
}

impl RequestAuth {
    /// Pick the scheme for a client.
    ///
    /// A signer takes precedence over an API key; an empty API key counts as
    /// absent.
    pub fn resolve(
        signer: Option<Arc<Signer>>,
        api_key: Option<&str>,
        auth_header: &str,
    ) -> Result<Self> {
        if let Some(signer) = signer {
            return Ok(Self::Signature(signer));
        }

        match api_key.filter(|k| !k.is_empty()) {
            Some(key) => Self::api_key(auth_header, key),
            None => Ok(Self::None),
        }
    }

    /// Static API key authentication
    pub fn api_key(header: &str, key: &str) -> Result<Self> {
        let header = HeaderName::from_bytes(header.as_bytes()).map_err(|e| {
            LedgerClientError::Config(format!("invalid auth header name `{}`: {}", header, e))
        })?;
        let mut value = HeaderValue::from_str(key)
            .map_err(|e| LedgerClientError::Config(format!("invalid API key: {}", e)))?;
        value.set_sensitive(true);

        Ok(Self::ApiKey { header, value })
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            Self::Signature(_) => AuthMode::Signature,
            Self::ApiKey { .. } => AuthMode::ApiKey,
            Self::None => AuthMode::None,
        }
    }

    /// Header to attach to a request carrying exactly `body`.
    ///
    /// Signed headers are generated fresh on every call.
    pub fn header_for(&self, body: &[u8]) -> Result<Option<(HeaderName, HeaderValue)>> {
        match self {
            Self::Signature(signer) => {
                let header = signer.generate_header(body)?;
                let value = HeaderValue::from_str(&header).map_err(|e| {
                    LedgerClientError::RequestBuild(format!("invalid Authorization header: {}", e))
                })?;
                Ok(Some((AUTHORIZATION, value)))
            }
            Self::ApiKey { header, value } => Ok(Some((header.clone(), value.clone()))),
            Self::None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::STANDARD};
    use deg_ledger_signing::AuthorizationHeader;

    fn signer() -> Arc<Signer> {
        Arc::new(Signer::new("bap", "k1", &STANDARD.encode([5u8; 32]), 30).unwrap())
    }

    #[test]
    fn test_signer_takes_precedence() {
        let auth = RequestAuth::resolve(Some(signer()), Some("api-key"), "X-API-Key").unwrap();
        assert_eq!(auth.mode(), AuthMode::Signature);

        let (name, _) = auth.header_for(b"{}").unwrap().unwrap();
        assert_eq!(name, AUTHORIZATION);
    }

    #[test]
    fn test_api_key_without_signer() {
        let auth = RequestAuth::resolve(None, Some("api-key"), "X-Ledger-Key").unwrap();
        assert_eq!(auth.mode(), AuthMode::ApiKey);

        let (name, value) = auth.header_for(b"{}").unwrap().unwrap();
        assert_eq!(name.as_str(), "x-ledger-key");
        assert_eq!(value.to_str().unwrap(), "api-key");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_nothing_configured() {
        let auth = RequestAuth::resolve(None, Some(""), "X-API-Key").unwrap();
        assert_eq!(auth.mode(), AuthMode::None);
        assert!(auth.header_for(b"{}").unwrap().is_none());

        let auth = RequestAuth::resolve(None, None, "X-API-Key").unwrap();
        assert_eq!(auth.mode(), AuthMode::None);
    }

    #[test]
    fn test_invalid_header_name() {
        let result = RequestAuth::resolve(None, Some("k"), "bad header");
        assert!(matches!(result, Err(LedgerClientError::Config(_))));
    }

    #[test]
    fn test_signed_header_covers_body() {
        let signer = signer();
        let auth = RequestAuth::Signature(Arc::clone(&signer));

        let (_, value) = auth.header_for(b"exact bytes").unwrap().unwrap();
        let header: AuthorizationHeader = value.to_str().unwrap().parse().unwrap();

        header
            .verify(b"exact bytes", &signer.verifying_key(), header.created())
            .unwrap();
        assert!(
            header
                .verify(b"other bytes", &signer.verifying_key(), header.created())
                .is_err()
        );
    }
}
