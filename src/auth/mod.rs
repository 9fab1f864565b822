//! Session authentication for zodiac-admin
//!
//! This module provides:
//! - Salted PBKDF2 password hashing
//! - HMAC-SHA256 signed session tokens
//! - Credential resolution (credential store first, static owner second)
//! - The login flow and bearer token authorization
//! - Rate limiting for failed logins

pub mod manager;
pub mod password;
pub mod ratelimit;
pub mod resolver;
pub mod timing;
pub mod token;

pub use manager::{AuthManager, AuthSettings, LoginOutcome, BEARER_PREFIX};
pub use password::{hash_password, verify_password, PasswordHasher, PASSWORD_ALGORITHM};
pub use ratelimit::{RateLimitConfig, RateLimiter};
pub use resolver::{normalize_email, Credential, CredentialResolver, StaticCredential};
pub use timing::constant_time_eq;
pub use token::{sign_token, verify_token, Secret, TokenCodec, DEFAULT_TOKEN_TTL_SECS};
