//! Credential resolution
//!
//! A login email resolves against the credential store first. Only when the
//! store has no record for it does the single static owner credential get a
//! chance. The store always wins, even for the owner's own email.

use std::sync::Arc;

use crate::database::Database;
use crate::error::DbError;
use crate::models::AdminAccount;

use super::timing::constant_time_eq;

/// Trim and lowercase an email for lookup and comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// The statically configured owner email/password pair
///
/// The password is plaintext configuration, compared exactly.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredential {
    email: String,
    password: String,
}

impl StaticCredential {
    /// Build the pair; `None` if either half is empty
    pub fn new(email: impl AsRef<str>, password: impl Into<String>) -> Option<Self> {
        let email = normalize_email(email.as_ref());
        let password = password.into();
        if email.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self { email, password })
    }

    /// Normalized owner email
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Exact, constant-time password comparison
    pub fn password_matches(&self, candidate: &str) -> bool {
        constant_time_eq(self.password.as_bytes(), candidate.as_bytes())
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where a login email resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    /// A record in the credential store
    Stored(AdminAccount),
    /// The static owner pair
    Static(StaticCredential),
}

/// Resolves emails to credentials, store first
pub struct CredentialResolver<D: Database> {
    db: Arc<D>,
    fallback: Option<StaticCredential>,
}

impl<D: Database> CredentialResolver<D> {
    /// Create a resolver over a credential store and optional static pair
    pub fn new(db: Arc<D>, fallback: Option<StaticCredential>) -> Self {
        Self { db, fallback }
    }

    /// Whether a static owner pair is configured
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Resolve an email to a credential
    ///
    /// A store lookup error is returned as-is. The static pair is only
    /// consulted once the store has answered that no record exists.
    pub async fn resolve(&self, email: &str) -> Result<Option<Credential>, DbError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }

        if let Some(account) = self.db.get_admin_by_email(&email).await? {
            return Ok(Some(Credential::Stored(account)));
        }

        Ok(self
            .fallback
            .as_ref()
            .filter(|fallback| fallback.email == email)
            .cloned()
            .map(Credential::Static))
    }
}
