//! Database layer for zodiac-admin
//!
//! This module defines the credential store trait and its SQLite implementation.

pub mod migrations;
pub mod sqlite;

pub use sqlite::SqliteDatabase;

use async_trait::async_trait;

use crate::error::DbError;
use crate::models::{AccountStatus, AdminAccount};

/// Persistent credential store
///
/// Emails handed to this trait are expected to be normalized already
/// (trimmed, lowercase). Implementations never delete accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Database: Send + Sync {
    /// Look up an admin by email
    async fn get_admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>, DbError>;

    /// Look up an admin by ID
    async fn get_admin(&self, id: i64) -> Result<Option<AdminAccount>, DbError>;

    /// Create an active admin
    ///
    /// Returns the new row ID. A duplicate email yields `ConstraintViolation`.
    async fn create_admin(&self, email: &str, password_hash: &str) -> Result<i64, DbError>;

    /// List all admins ordered by ID
    async fn list_admins(&self) -> Result<Vec<AdminAccount>, DbError>;

    /// Number of stored admins, whatever their status
    async fn count_admins(&self) -> Result<u64, DbError>;

    /// Replace an admin's password hash
    async fn update_admin_password(&self, id: i64, password_hash: &str) -> Result<(), DbError>;

    /// Enable or disable an admin
    async fn set_admin_status(&self, id: i64, status: AccountStatus) -> Result<(), DbError>;

    /// Stamp the last successful login
    async fn update_last_login(&self, id: i64) -> Result<(), DbError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: MockDatabase returns a stored admin
    #[tokio::test]
    async fn test_mock_database_get_admin_by_email() {
        let mut mock = MockDatabase::new();

        mock.expect_get_admin_by_email()
            .withf(|email| email == "astro@example.com")
            .returning(|email| Ok(Some(AdminAccount::new(1, email, "hash"))));

        let admin = mock
            .get_admin_by_email("astro@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.id, 1);
        assert!(admin.is_active());
    }

    // Test 2: MockDatabase returns None for unknown email
    #[tokio::test]
    async fn test_mock_database_unknown_email() {
        let mut mock = MockDatabase::new();

        mock.expect_get_admin_by_email().returning(|_| Ok(None));

        let result = mock.get_admin_by_email("nobody@example.com").await;
        assert!(result.unwrap().is_none());
    }

    // Test 3: MockDatabase create_admin
    #[tokio::test]
    async fn test_mock_database_create_admin() {
        let mut mock = MockDatabase::new();

        mock.expect_create_admin()
            .withf(|email, hash| email == "astro@example.com" && hash.starts_with("pbkdf2_sha256$"))
            .returning(|_, _| Ok(42));

        let id = mock
            .create_admin("astro@example.com", "pbkdf2_sha256$1$aa$bb")
            .await
            .unwrap();
        assert_eq!(id, 42);
    }

    // Test 4: MockDatabase set_admin_status propagates NotFound
    #[tokio::test]
    async fn test_mock_database_set_status_not_found() {
        let mut mock = MockDatabase::new();

        mock.expect_set_admin_status()
            .returning(|_, _| Err(DbError::NotFound));

        let result = mock.set_admin_status(99, AccountStatus::Disabled).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }
}
