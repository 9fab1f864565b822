//! Admin credential models
//!
//! This module defines the persisted admin account, its status and the login
//! event emitted after a successful sign-in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::claims::Role;

/// Whether a stored credential may authenticate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Account can sign in
    #[default]
    Active,
    /// Account is locked out regardless of password
    Disabled,
}

impl AccountStatus {
    /// Check if the status allows authentication
    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Disabled => write!(f, "disabled"),
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "disabled" => Ok(AccountStatus::Disabled),
            _ => Err(format!("Invalid account status: {}", s)),
        }
    }
}

/// Admin account stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    /// Row ID, echoed into tokens as `adminId`
    pub id: i64,

    /// Normalized (trimmed, lowercase) email
    pub email: String,

    /// Self-describing PBKDF2 hash string
    pub password_hash: String,

    /// Account status
    pub status: AccountStatus,

    /// When the account was created
    pub created_at: Option<DateTime<Utc>>,

    /// When the account last signed in
    pub last_login_at: Option<DateTime<Utc>>,
}

impl AdminAccount {
    /// Create a new active account
    pub fn new(id: i64, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            password_hash: password_hash.into(),
            status: AccountStatus::Active,
            created_at: Some(Utc::now()),
            last_login_at: None,
        }
    }

    /// Set account status
    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    /// Check if the account may authenticate
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Admin account as exposed over the API, without its password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSummary {
    pub id: i64,
    pub email: String,
    pub status: AccountStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&AdminAccount> for AdminSummary {
    fn from(account: &AdminAccount) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            status: account.status,
            created_at: account.created_at,
            last_login_at: account.last_login_at,
        }
    }
}

/// Emitted after a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    /// Email that signed in
    pub email: String,

    /// Role granted to the session
    pub role: Role,

    /// When the login happened
    pub at: DateTime<Utc>,

    /// Caller IP, when known
    pub ip: Option<String>,
}

impl LoginEvent {
    /// Create a login event timestamped now
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            role,
            at: Utc::now(),
            ip: None,
        }
    }

    /// Set caller IP
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }
}
