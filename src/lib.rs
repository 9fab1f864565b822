//! zodiac-admin - Admin session authentication for the Zodiac storefront
//!
//! This crate issues and verifies HMAC-signed session tokens, hashes admin
//! passwords with PBKDF2 and gates the admin HTTP API behind a bearer token.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod notify;
pub mod server;
pub mod telemetry;
