//! Engine and server configuration.
//!
//! All thresholds default to the values the detectors were tuned with; a
//! TOML file can override any subset of them.

use serde::Deserialize;

use crate::error::{AnalysisError, Result};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Analysis engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| AnalysisError::Config(format!("failed to parse '{path}': {e}")))
    }
}

/// Analysis engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Maximum accepted CSV body size in bytes.
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: usize,
    /// Cycle detector thresholds.
    #[serde(default)]
    pub cycle: CycleConfig,
    /// Smurfing detector thresholds.
    #[serde(default)]
    pub smurfing: SmurfingConfig,
    /// Shell-network detector thresholds.
    #[serde(default)]
    pub shell: ShellConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_input_bytes(),
            cycle: CycleConfig::default(),
            smurfing: SmurfingConfig::default(),
            shell: ShellConfig::default(),
        }
    }
}

/// Cycle detector thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct CycleConfig {
    /// Maximum cycle length in nodes.
    #[serde(default = "default_cycle_max_length")]
    pub max_length: usize,
    /// Temporal coherence window in hours.
    #[serde(default = "default_window_hours")]
    pub window_hours: f64,
    /// Global cap on emitted cycles.
    #[serde(default = "default_max_cycles")]
    pub max_cycles: usize,
    /// DFS frame budget per root node.
    #[serde(default = "default_max_frames_per_root")]
    pub max_frames_per_root: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            max_length: default_cycle_max_length(),
            window_hours: default_window_hours(),
            max_cycles: default_max_cycles(),
            max_frames_per_root: default_max_frames_per_root(),
        }
    }
}

/// Smurfing detector thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct SmurfingConfig {
    /// Minimum unique counterparties within one window.
    #[serde(default = "default_fan_threshold")]
    pub fan_threshold: usize,
    /// Sliding window length in hours.
    #[serde(default = "default_window_hours")]
    pub window_hours: f64,
}

impl Default for SmurfingConfig {
    fn default() -> Self {
        Self {
            fan_threshold: default_fan_threshold(),
            window_hours: default_window_hours(),
        }
    }
}

/// Shell-network detector thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    /// Maximum total transaction count for a pass-through intermediary.
    #[serde(default = "default_max_intermediate_txns")]
    pub max_intermediate_txns: usize,
    /// Minimum chain length in edges.
    #[serde(default = "default_min_chain_edges")]
    pub min_chain_edges: usize,
    /// Maximum chain length in edges.
    #[serde(default = "default_max_chain_edges")]
    pub max_chain_edges: usize,
    /// Global cap on emitted chains.
    #[serde(default = "default_max_paths")]
    pub max_paths: usize,
    /// Cap on emitted chains per source node.
    #[serde(default = "default_max_paths_per_source")]
    pub max_paths_per_source: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            max_intermediate_txns: default_max_intermediate_txns(),
            min_chain_edges: default_min_chain_edges(),
            max_chain_edges: default_max_chain_edges(),
            max_paths: default_max_paths(),
            max_paths_per_source: default_max_paths_per_source(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_max_input_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_cycle_max_length() -> usize {
    5
}

fn default_window_hours() -> f64 {
    72.0
}

fn default_max_cycles() -> usize {
    5_000
}

fn default_max_frames_per_root() -> usize {
    30_000
}

fn default_fan_threshold() -> usize {
    10
}

fn default_max_intermediate_txns() -> usize {
    3
}

fn default_min_chain_edges() -> usize {
    3
}

fn default_max_chain_edges() -> usize {
    6
}

fn default_max_paths() -> usize {
    2_000
}

fn default_max_paths_per_source() -> usize {
    200
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}
