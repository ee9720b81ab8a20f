//! Database module providing organized access to all database operations
//!
//! This module is organized into several sub-modules:
//! - `connection`: Database connection management and pool configuration
//! - `accounts`: Connected-account operations
//! - `metric_cache`: Cached computed-view operations
//! - `service`: Main DatabaseService that provides a unified interface

pub mod accounts;
pub mod connection;
pub mod metric_cache;
pub mod service;

// Re-export the main types and service for easy access
pub use connection::{DbConnection, DbPool, MIGRATIONS};
pub use service::DatabaseService;

// Re-export operation structs for advanced usage
pub use accounts::AccountOperations;
pub use metric_cache::MetricCacheOperations;
