//! SQLite implementation of the Database trait
//!
//! This module provides a SQLite-based credential store using rusqlite and
//! tokio-rusqlite for async operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row};
use tokio_rusqlite::Connection;

use super::migrations::CREATE_SCHEMA;
use super::Database;
use crate::error::DbError;
use crate::models::{AccountStatus, AdminAccount};

const ADMIN_COLUMNS: &str = "id, email, password_hash, status, created_at, last_login_at";

/// SQLite database implementation
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Create a new SQLite database connection
    ///
    /// Use `:memory:` for in-memory database or a file path for persistent storage.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let conn = Connection::open(path).await?;

        conn.call(|conn| {
            conn.execute_batch(CREATE_SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(Self { conn })
    }

    /// Create a new in-memory database (useful for testing)
    pub async fn in_memory() -> Result<Self, DbError> {
        Self::new(":memory:").await
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn get_admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>, DbError> {
        let email = email.to_string();

        self.conn
            .call(move |conn| {
                let sql = format!("SELECT {} FROM admins WHERE email = ?1", ADMIN_COLUMNS);
                let admin = conn
                    .query_row(&sql, [&email], admin_from_row)
                    .optional()?;
                Ok(admin)
            })
            .await
            .map_err(Into::into)
    }

    async fn get_admin(&self, id: i64) -> Result<Option<AdminAccount>, DbError> {
        self.conn
            .call(move |conn| {
                let sql = format!("SELECT {} FROM admins WHERE id = ?1", ADMIN_COLUMNS);
                let admin = conn.query_row(&sql, [id], admin_from_row).optional()?;
                Ok(admin)
            })
            .await
            .map_err(Into::into)
    }

    async fn create_admin(&self, email: &str, password_hash: &str) -> Result<i64, DbError> {
        let email = email.to_string();
        let password_hash = password_hash.to_string();
        let status = AccountStatus::Active.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO admins (email, password_hash, status) VALUES (?1, ?2, ?3)",
                    rusqlite::params![email, password_hash, status],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::Sqlite(rusqlite::Error::SqliteFailure(err, msg))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    DbError::ConstraintViolation(
                        msg.unwrap_or_else(|| "admin email already exists".to_string()),
                    )
                }
                other => other,
            })
    }

    async fn list_admins(&self) -> Result<Vec<AdminAccount>, DbError> {
        self.conn
            .call(|conn| {
                let sql = format!("SELECT {} FROM admins ORDER BY id", ADMIN_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;

                let admins = stmt
                    .query_map([], admin_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(admins)
            })
            .await
            .map_err(Into::into)
    }

    async fn count_admins(&self) -> Result<u64, DbError> {
        self.conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?;
                Ok(count.max(0) as u64)
            })
            .await
            .map_err(Into::into)
    }

    async fn update_admin_password(&self, id: i64, password_hash: &str) -> Result<(), DbError> {
        let password_hash = password_hash.to_string();

        let rows_affected = self
            .conn
            .call(move |conn| {
                let count = conn.execute(
                    "UPDATE admins SET password_hash = ?1 WHERE id = ?2",
                    rusqlite::params![password_hash, id],
                )?;
                Ok(count)
            })
            .await?;

        if rows_affected == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn set_admin_status(&self, id: i64, status: AccountStatus) -> Result<(), DbError> {
        let status = status.to_string();

        let rows_affected = self
            .conn
            .call(move |conn| {
                let count = conn.execute(
                    "UPDATE admins SET status = ?1 WHERE id = ?2",
                    rusqlite::params![status, id],
                )?;
                Ok(count)
            })
            .await?;

        if rows_affected == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn update_last_login(&self, id: i64) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE admins SET last_login_at = ?1 WHERE id = ?2",
                    rusqlite::params![now, id],
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }
}

fn admin_from_row(row: &Row<'_>) -> rusqlite::Result<AdminAccount> {
    Ok(AdminAccount {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        status: parse_status(&row.get::<_, String>(3)?),
        created_at: parse_datetime(row.get::<_, Option<String>>(4)?),
        last_login_at: parse_datetime(row.get::<_, Option<String>>(5)?),
    })
}

/// Unrecognized values lock the account out
fn parse_status(s: &str) -> AccountStatus {
    s.parse().unwrap_or(AccountStatus::Disabled)
}

/// Parse RFC 3339 or SQLite `CURRENT_TIMESTAMP` values
fn parse_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| {
                chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|dt| dt.and_utc())
            })
    })
}
