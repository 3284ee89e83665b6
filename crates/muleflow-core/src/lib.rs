//! # Muleflow Core
//!
//! Core abstractions shared across the muleflow workspace.
//!
//! This crate provides:
//! - Error taxonomy for the analysis pipeline
//! - Engine and server configuration with TOML loading
//! - Logging bootstrap

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{AppConfig, CycleConfig, EngineConfig, ShellConfig, SmurfingConfig};
    pub use crate::error::{AnalysisError, Result};
}
