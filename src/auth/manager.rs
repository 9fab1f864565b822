//! Authentication manager
//!
//! This module provides the main authentication interface for the application.
//! It runs the login flow, authorizes bearer tokens and provisions admins.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AuthConfig;
use crate::database::Database;
use crate::error::{AppError, AuthError, DbError};
use crate::models::{AccountStatus, AdminAccount, AdminSummary, Claims, LoginEvent, Principal};
use crate::notify::{notify_in_background, LogNotifier, LoginNotifier};

use super::password::{verify_password, PasswordHasher};
use super::ratelimit::{RateLimitConfig, RateLimiter};
use super::resolver::{normalize_email, Credential, CredentialResolver, StaticCredential};
use super::token::{Secret, TokenCodec};

/// Prefix required on the `Authorization` header
pub const BEARER_PREFIX: &str = "Bearer ";

/// Runtime authentication settings
#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    /// Token codec; `None` when no secret is configured
    pub codec: Option<TokenCodec>,

    /// Static owner credential
    pub fallback: Option<StaticCredential>,

    /// Hasher for newly stored passwords
    pub hasher: PasswordHasher,

    /// Failed login throttling
    pub rate_limit: RateLimitConfig,
}

impl AuthSettings {
    /// Build runtime settings from configuration
    ///
    /// An empty secret is treated as absent, and so is any value still holding
    /// an unexpanded `${VAR}` placeholder.
    pub fn from_config(config: &AuthConfig) -> Self {
        let codec = configured_value("auth.secret", config.secret.as_deref())
            .and_then(|s| Secret::new(s.as_bytes()))
            .map(|secret| TokenCodec::new(secret).with_ttl(config.token_ttl_secs));

        let fallback = match (
            configured_value("auth.owner_email", config.owner_email.as_deref()),
            configured_value("auth.owner_password", config.owner_password.as_deref()),
        ) {
            (Some(email), Some(password)) => StaticCredential::new(email, password),
            _ => None,
        };

        Self {
            codec,
            fallback,
            hasher: PasswordHasher::with_iterations(config.password_iterations),
            rate_limit: RateLimitConfig {
                max_failures: config.rate_limit.max_failures,
                block_duration: Duration::from_secs(config.rate_limit.block_duration_secs),
                window_duration: Duration::from_secs(config.rate_limit.window_duration_secs),
            },
        }
    }
}

fn configured_value<'a>(field: &str, value: Option<&'a str>) -> Option<&'a str> {
    let value = value?;
    if value.contains("${") {
        tracing::warn!(field, "Ignoring setting with an unexpanded environment variable");
        return None;
    }
    Some(value)
}

/// Result of a successful login
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    /// Signed session token
    pub token: String,

    /// Identity the token carries
    pub principal: Principal,
}

/// Authentication manager
///
/// Provides methods for logging in, authorizing requests and managing
/// stored admin credentials.
pub struct AuthManager<D: Database> {
    db: Arc<D>,
    resolver: CredentialResolver<D>,
    codec: Option<TokenCodec>,
    hasher: PasswordHasher,
    rate_limiter: RateLimiter,
    notifier: Arc<dyn LoginNotifier>,
}

impl<D: Database + 'static> AuthManager<D> {
    /// Create a new authentication manager that logs login events
    pub fn new(db: Arc<D>, settings: AuthSettings) -> Self {
        Self {
            resolver: CredentialResolver::new(Arc::clone(&db), settings.fallback),
            db,
            codec: settings.codec,
            hasher: settings.hasher,
            rate_limiter: RateLimiter::new(settings.rate_limit),
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Replace the login notifier
    pub fn with_notifier(mut self, notifier: Arc<dyn LoginNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Check if a session secret is configured
    pub fn is_configured(&self) -> bool {
        self.codec.is_some()
    }

    /// Exchange an email and password for a session token
    ///
    /// Every credential failure surfaces as `InvalidCredentials` or
    /// `AccountDisabled`; callers must present both identically.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ip: Option<IpAddr>,
    ) -> Result<LoginOutcome, AuthError> {
        let codec = self
            .codec
            .as_ref()
            .ok_or_else(|| AuthError::Configuration("session secret is not set".to_string()))?;

        if let Some(ip) = ip {
            if self.rate_limiter.is_blocked(ip) {
                tracing::warn!(ip = %ip, "Login refused, client is rate limited");
                return Err(AuthError::RateLimited);
            }
        }

        let claims = match self.check_credentials(email, password).await {
            Ok(claims) => claims,
            Err(e) => {
                if e.is_credential_failure() {
                    if let Some(ip) = ip {
                        self.rate_limiter.record_failure(ip);
                    }
                    tracing::warn!(reason = failure_reason(&e), "Login failed");
                }
                return Err(e);
            }
        };

        let principal = claims
            .principal()
            .ok_or_else(|| AuthError::Internal("claims without principal".to_string()))?;
        let admin_id = claims.admin_id;
        let token = codec.sign(claims)?;

        if let Some(ip) = ip {
            self.rate_limiter.reset(ip);
        }
        if let Some(id) = admin_id {
            if let Err(e) = self.db.update_last_login(id).await {
                tracing::warn!(error = %e, admin_id = id, "Failed to record last login");
            }
        }

        tracing::info!(email = %principal.email, role = %principal.role, "Login succeeded");

        let mut event = LoginEvent::new(principal.email.clone(), principal.role);
        if let Some(ip) = ip {
            event = event.with_ip(ip.to_string());
        }
        notify_in_background(Arc::clone(&self.notifier), event);

        Ok(LoginOutcome { token, principal })
    }

    async fn check_credentials(&self, email: &str, password: &str) -> Result<Claims, AuthError> {
        let resolved = self.resolver.resolve(email).await.map_err(|e| {
            tracing::error!(error = %e, "Credential store lookup failed");
            AuthError::Internal(e.to_string())
        })?;

        match resolved {
            Some(Credential::Stored(account)) => {
                if !account.is_active() {
                    return Err(AuthError::AccountDisabled);
                }

                let AdminAccount {
                    id,
                    email,
                    password_hash,
                    ..
                } = account;
                let password = password.to_string();
                let verified =
                    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                        .await
                        .map_err(|e| AuthError::Internal(e.to_string()))?;

                if verified {
                    Ok(Claims::admin(email, id))
                } else {
                    Err(AuthError::InvalidCredentials)
                }
            }
            Some(Credential::Static(owner)) => {
                if owner.password_matches(password) {
                    Ok(Claims::owner(owner.email()))
                } else {
                    Err(AuthError::InvalidCredentials)
                }
            }
            None => {
                if self.resolver.has_fallback() || self.has_stored_admins().await? {
                    Err(AuthError::InvalidCredentials)
                } else {
                    Err(AuthError::Configuration(
                        "no owner credential and no stored admins".to_string(),
                    ))
                }
            }
        }
    }

    /// Whether any admin is stored; decides login availability for the whole
    /// deployment rather than per email
    async fn has_stored_admins(&self) -> Result<bool, AuthError> {
        self.db
            .count_admins()
            .await
            .map(|count| count > 0)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Authorize a request from its `Authorization` header value
    pub fn authorize(&self, header: Option<&str>) -> Result<Principal, AuthError> {
        let token = header
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
            .ok_or(AuthError::MissingAuth)?;

        let codec = self
            .codec
            .as_ref()
            .ok_or_else(|| AuthError::Configuration("session secret is not set".to_string()))?;

        let claims = codec.decode(token.trim())?;
        claims.principal().ok_or(AuthError::MalformedToken)
    }

    /// Provision a stored admin
    ///
    /// Returns the new admin's ID.
    pub async fn create_admin(&self, email: &str, password: &str) -> Result<i64, AppError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(
                "email and password are required".to_string(),
            ));
        }

        let hash = self.hash_password(password).await?;
        let id = self.db.create_admin(&email, &hash).await?;

        tracing::info!(admin_id = id, email = %email, "Admin created");
        Ok(id)
    }

    /// List stored admins without their hashes
    pub async fn list_admins(&self) -> Result<Vec<AdminSummary>, AppError> {
        let admins = self.db.list_admins().await?;
        Ok(admins.iter().map(AdminSummary::from).collect())
    }

    /// Re-hash and store a new password for an admin
    pub async fn change_password(&self, id: i64, password: &str) -> Result<(), AppError> {
        if password.is_empty() {
            return Err(AppError::InvalidInput("password is required".to_string()));
        }

        let hash = self.hash_password(password).await?;
        self.db.update_admin_password(id, &hash).await?;

        tracing::info!(admin_id = id, "Admin password changed");
        Ok(())
    }

    /// Enable or disable an admin
    pub async fn set_admin_status(&self, id: i64, status: AccountStatus) -> Result<(), AppError> {
        self.db.set_admin_status(id, status).await?;

        tracing::info!(admin_id = id, status = %status, "Admin status changed");
        Ok(())
    }

    /// Look up a stored admin
    pub async fn get_admin(&self, id: i64) -> Result<AdminSummary, AppError> {
        self.db
            .get_admin(id)
            .await?
            .map(|account| AdminSummary::from(&account))
            .ok_or(AppError::Database(DbError::NotFound))
    }

    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Check if an IP is rate limited
    pub fn is_rate_limited(&self, ip: IpAddr) -> bool {
        self.rate_limiter.is_blocked(ip)
    }

    /// Drop expired rate limit entries
    pub fn prune_rate_limits(&self) {
        self.rate_limiter.cleanup();
    }
}

fn failure_reason(err: &AuthError) -> &'static str {
    match err {
        AuthError::AccountDisabled => "account_disabled",
        _ => "invalid_credentials",
    }
}
