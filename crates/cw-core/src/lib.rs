//! cw-core - Core library for cowrie-db
//!
//! This crate provides the shared configuration model, the core error type,
//! and checksum helpers used across all cowrie-db components.

pub mod checksum;
pub mod config;
pub mod error;

pub use checksum::compute_checksum;
pub use config::{Config, DatabaseConfig, MigrationConfig, SqliteConfig, SqliteJournalMode};
pub use error::{CoreError, CoreResult};
