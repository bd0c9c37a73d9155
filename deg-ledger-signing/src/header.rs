//! Authorization header value type

use crate::{Result, SigningError, signing_string};
use base64::{Engine, engine::general_purpose::STANDARD};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use std::fmt;
use std::str::FromStr;

/// Signature algorithm advertised in the header
pub const ALGORITHM: &str = "ed25519";

/// Pseudo-headers covered by the signature, in signing order
pub const SIGNED_HEADERS: &str = "(created) (expires) digest";

/// A parsed or freshly generated Beckn `Signature` Authorization header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    subscriber_id: String,
    unique_key_id: String,
    created: i64,
    expires: i64,
    signature: Signature,
}

impl AuthorizationHeader {
    pub(crate) fn new(
        subscriber_id: String,
        unique_key_id: String,
        created: i64,
        expires: i64,
        signature: Signature,
    ) -> Self {
        Self {
            subscriber_id,
            unique_key_id,
            created,
            expires,
            signature,
        }
    }

    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    pub fn unique_key_id(&self) -> &str {
        &self.unique_key_id
    }

    pub fn created(&self) -> i64 {
        self.created
    }

    pub fn expires(&self) -> i64 {
        self.expires
    }

    /// Standard padded base64 of the raw 64-byte signature
    pub fn signature_base64(&self) -> String {
        STANDARD.encode(self.signature.to_bytes())
    }

    /// Check the header against a payload, a public key and a point in time.
    ///
    /// `now` must fall inside `[created, expires)`.
    pub fn verify(&self, payload: &[u8], key: &VerifyingKey, now: i64) -> Result<()> {
        if now < self.created {
            return Err(SigningError::NotYetValid {
                created: self.created,
                now,
            });
        }
        if now >= self.expires {
            return Err(SigningError::Expired {
                expires: self.expires,
                now,
            });
        }

        let message = signing_string(payload, self.created, self.expires);
        key.verify(message.as_bytes(), &self.signature)
            .map_err(|e| SigningError::SignatureInvalid(e.to_string()))
    }
}

impl fmt::Display for AuthorizationHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signature keyId=\"{}|{}|{}\",algorithm=\"{}\",created=\"{}\",expires=\"{}\",headers=\"{}\",signature=\"{}\"",
            self.subscriber_id,
            self.unique_key_id,
            ALGORITHM,
            ALGORITHM,
            self.created,
            self.expires,
            SIGNED_HEADERS,
            self.signature_base64()
        )
    }
}

impl FromStr for AuthorizationHeader {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self> {
        let params = s
            .trim()
            .strip_prefix("Signature ")
            .ok_or_else(|| invalid("missing `Signature` scheme"))?;

        let mut key_id = None;
        let mut algorithm = None;
        let mut created = None;
        let mut expires = None;
        let mut headers = None;
        let mut signature = None;

        for (name, value) in parse_params(params)? {
            match name {
                "keyId" => key_id = Some(value),
                "algorithm" => algorithm = Some(value),
                "created" => created = Some(value),
                "expires" => expires = Some(value),
                "headers" => headers = Some(value),
                "signature" => signature = Some(value),
                _ => {}
            }
        }

        let key_id = key_id.ok_or_else(|| invalid("missing keyId"))?;
        let mut parts = key_id.split('|');
        let (subscriber_id, unique_key_id, key_algorithm) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(s), Some(k), Some(a), None) if !s.is_empty() && !k.is_empty() => (s, k, a),
                _ => return Err(invalid("keyId must be <subscriberID>|<uniqueKeyID>|<algorithm>")),
            };

        if key_algorithm != ALGORITHM || algorithm != Some(ALGORITHM) {
            return Err(invalid("unsupported algorithm"));
        }
        if let Some(h) = headers
            && h != SIGNED_HEADERS
        {
            return Err(invalid(&format!("unexpected headers list `{}`", h)));
        }

        let created = parse_timestamp(created, "created")?;
        let expires = parse_timestamp(expires, "expires")?;
        if expires < created {
            return Err(invalid("expires precedes created"));
        }

        let raw = STANDARD
            .decode(signature.ok_or_else(|| invalid("missing signature"))?)
            .map_err(|e| invalid(&format!("signature is not base64: {}", e)))?;
        let signature =
            Signature::from_slice(&raw).map_err(|e| invalid(&format!("bad signature: {}", e)))?;

        Ok(Self {
            subscriber_id: subscriber_id.to_string(),
            unique_key_id: unique_key_id.to_string(),
            created,
            expires,
            signature,
        })
    }
}

fn invalid(msg: &str) -> SigningError {
    SigningError::InvalidHeader(msg.to_string())
}

fn parse_timestamp(value: Option<&str>, name: &str) -> Result<i64> {
    value
        .ok_or_else(|| invalid(&format!("missing {}", name)))?
        .parse()
        .map_err(|_| invalid(&format!("{} is not an integer", name)))
}

/// Split `a="x",b="y"` into name/value pairs. Values are always quoted.
fn parse_params(mut rest: &str) -> Result<Vec<(&str, &str)>> {
    let mut params = Vec::new();

    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| invalid("expected `name=\"value\"`"))?;
        let name = rest[..eq].trim();
        let after = rest[eq + 1..]
            .strip_prefix('"')
            .ok_or_else(|| invalid(&format!("value of `{}` is not quoted", name)))?;
        let close = after
            .find('"')
            .ok_or_else(|| invalid(&format!("unterminated value for `{}`", name)))?;

        params.push((name, &after[..close]));

        rest = after[close + 1..].trim_start();
        if let Some(next) = rest.strip_prefix(',') {
            rest = next.trim_start();
        } else if !rest.is_empty() {
            return Err(invalid("parameters must be comma separated"));
        }
    }

    Ok(params)
}
