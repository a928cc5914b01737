//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Database connection and migrations (db)
//! - Scoped transactions (transaction)
//! - HTTP server setup (server)
//! - Configuration loading (config)
//! - Bearer-token identity (auth)
//! - Application state (state)

pub mod auth;
pub mod config;
pub mod db;
pub mod seed;
pub mod server;
pub mod state;
pub mod transaction;

pub use state::AppState;
pub use transaction::in_transaction;
