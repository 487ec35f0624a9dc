//! Streamsync Core Library
//!
//! This crate provides the domain models, error types, configuration and host
//! interfaces shared by the streamsync crates.

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;

// Re-export commonly used types
pub use config::{StreamConfig, UploadProtocol};
pub use error::{LogLevel, SyncError, SyncResult};
pub use hooks::{AssetLibrary, AssetLifecycle};
