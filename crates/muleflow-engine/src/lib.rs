//! # Muleflow Engine
//!
//! Offline batch analysis engine for money-muling detection.
//!
//! The engine is a pure function from CSV bytes to an [`AnalysisResult`]:
//! it parses and validates a transaction batch, builds an immutable
//! directed multigraph plus a timestamp index, runs three pattern
//! detectors concurrently (cycles, smurfing, shell networks), annotates
//! accounts with legitimacy heuristics, and combines everything through a
//! rule-based scorer into suspicious accounts, fraud rings, and a
//! visualization-ready graph.
//!
//! ```rust,ignore
//! use muleflow_core::config::EngineConfig;
//! use muleflow_engine::AnalysisEngine;
//!
//! let result = AnalysisEngine::analyze(csv_bytes, &EngineConfig::default())?;
//! println!("{} suspicious accounts", result.suspicious_accounts.len());
//! ```

#![warn(missing_docs)]

pub mod detect;
pub mod engine;
pub mod filters;
pub mod graph;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod timeindex;
pub mod types;

pub use engine::AnalysisEngine;
pub use graph::TransactionGraph;
pub use timeindex::TimeIndex;
pub use types::{AnalysisResult, AnalysisStatus};
