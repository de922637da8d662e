//! Lucky Koi synchronization core
//!
//! This module exposes the sync components for use by the binary and tests.

pub mod chain_client;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state_manager;
pub mod wallet;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult, ErrorKind, TxError};
pub use state_manager::SyncState;
