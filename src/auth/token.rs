//! Session token signing and verification
//!
//! Tokens are compact, JWT-shaped strings of three base64url (unpadded)
//! segments:
//!
//! ```text
//! base64url({"alg":"HS256","typ":"JWT"}) . base64url(claims JSON) . base64url(HMAC-SHA256)
//! ```
//!
//! The signature is an HMAC-SHA256 over the literal `header.payload` string,
//! keyed by the process secret. Only this one algorithm exists; the header is
//! never consulted to choose another.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::timing::constant_time_eq;
use crate::error::AuthError;
use crate::models::Claims;

type HmacSha256 = Hmac<Sha256>;

/// Fixed header JSON for every token
pub const TOKEN_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Default token lifetime: 7 days
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 604_800;

/// HMAC key for token signing
///
/// Never empty; [`Secret::new`] refuses empty input so a missing secret can
/// only be represented as `None` by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Wrap a secret, returning `None` for empty input
    pub fn new(bytes: impl Into<Vec<u8>>) -> Option<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            None
        } else {
            Some(Self(bytes))
        }
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Signs and verifies session tokens with a fixed secret and lifetime
#[derive(Debug, Clone)]
pub struct TokenCodec {
    secret: Secret,
    ttl_secs: i64,
}

impl TokenCodec {
    /// Create a codec with the default 7 day lifetime
    pub fn new(secret: Secret) -> Self {
        Self {
            secret,
            ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }

    /// Set the lifetime of newly signed tokens
    pub fn with_ttl(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Lifetime of newly signed tokens in seconds
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Sign claims, issued now
    pub fn sign(&self, claims: Claims) -> Result<String, AuthError> {
        self.sign_at(claims, Utc::now().timestamp())
    }

    /// Sign claims as if issued at `issued_at` (seconds since the epoch)
    ///
    /// `iat` and `exp` are always overwritten: `iat = issued_at`,
    /// `exp = issued_at + ttl`.
    pub fn sign_at(&self, claims: Claims, issued_at: i64) -> Result<String, AuthError> {
        encode(claims, self.secret.as_bytes(), issued_at, self.ttl_secs)
    }

    /// Verify a token now; `None` on any failure
    pub fn verify(&self, token: &str) -> Option<Claims> {
        self.decode(token).ok()
    }

    /// Verify a token at `now`; `None` on any failure
    pub fn verify_at(&self, token: &str, now: i64) -> Option<Claims> {
        self.decode_at(token, now).ok()
    }

    /// Verify a token now, keeping the reason for failure
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode_at(token, Utc::now().timestamp())
    }

    /// Verify a token at `now`, keeping the reason for failure
    ///
    /// The failure reason is for logging only; callers facing the network must
    /// not reveal which variant occurred.
    pub fn decode_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        decode(token, self.secret.as_bytes(), now)
    }
}

/// Sign claims with a raw secret, issued now
///
/// Fails with [`AuthError::Configuration`] when `secret` is empty.
pub fn sign_token(claims: Claims, secret: &[u8], ttl_secs: i64) -> Result<String, AuthError> {
    encode(claims, secret, Utc::now().timestamp(), ttl_secs)
}

/// Verify a token with a raw secret at the current time
///
/// Returns `None` for empty input, an empty secret, a malformed or tampered
/// token, a token signed with another secret, or an expired token.
///
/// # Example
///
/// ```
/// use zodiac_admin::auth::token::{sign_token, verify_token, DEFAULT_TOKEN_TTL_SECS};
/// use zodiac_admin::models::Claims;
///
/// let token = sign_token(Claims::owner("owner@example.com"), b"s3cret", DEFAULT_TOKEN_TTL_SECS).unwrap();
/// let claims = verify_token(&token, b"s3cret").unwrap();
/// assert_eq!(claims.email.as_deref(), Some("owner@example.com"));
/// assert!(verify_token(&token, b"other").is_none());
/// ```
pub fn verify_token(token: &str, secret: &[u8]) -> Option<Claims> {
    decode(token, secret, Utc::now().timestamp()).ok()
}

fn encode(
    mut claims: Claims,
    secret: &[u8],
    issued_at: i64,
    ttl_secs: i64,
) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::Configuration(
            "token secret is empty".to_string(),
        ));
    }

    claims.iat = Some(issued_at);
    claims.exp = Some(issued_at.saturating_add(ttl_secs));

    let payload_json =
        serde_json::to_vec(&claims).map_err(|e| AuthError::Internal(e.to_string()))?;

    let header = URL_SAFE_NO_PAD.encode(TOKEN_HEADER);
    let payload = URL_SAFE_NO_PAD.encode(payload_json);
    let signing_input = format!("{}.{}", header, payload);
    let sig = signature(secret, &signing_input)?;

    Ok(format!("{}.{}", signing_input, sig))
}

fn decode(token: &str, secret: &[u8], now: i64) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::Configuration(
            "token secret is empty".to_string(),
        ));
    }
    if token.is_empty() {
        return Err(AuthError::MalformedToken);
    }

    let parts: Vec<&str> = token.split('.').collect();
    let [header, payload, provided] = parts.as_slice() else {
        return Err(AuthError::MalformedToken);
    };
    if header.is_empty() || payload.is_empty() || provided.is_empty() {
        return Err(AuthError::MalformedToken);
    }

    // Nothing in the payload is looked at until the signature matches.
    let expected = signature(secret, &format!("{}.{}", header, payload))?;
    if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        return Err(AuthError::SignatureMismatch);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AuthError::MalformedToken)?;
    let payload = String::from_utf8(payload).map_err(|_| AuthError::MalformedToken)?;
    let claims: Claims =
        serde_json::from_str(&payload).map_err(|_| AuthError::MalformedToken)?;

    if let Some(exp) = claims.exp {
        if exp < now {
            return Err(AuthError::ExpiredToken);
        }
    }

    Ok(claims)
}

/// base64url(HMAC-SHA256(secret, signing_input))
fn signature(secret: &[u8], signing_input: &str) -> Result<String, AuthError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| AuthError::Internal(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}
