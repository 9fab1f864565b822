//! Domain models for zodiac-admin
//!
//! This module contains the credential records, token claims and principals
//! used throughout the authentication flow.

pub mod admin;
pub mod claims;

// Re-export commonly used types
pub use admin::{AccountStatus, AdminAccount, AdminSummary, LoginEvent};
pub use claims::{Claims, Principal, Role};
