//! Data model for the analysis engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Transactions
// ============================================================================

/// A single validated money transfer (one CSV row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Optional opaque transaction identifier.
    pub transaction_id: Option<String>,
    /// Sending account id.
    pub sender: String,
    /// Receiving account id.
    pub receiver: String,
    /// Transfer amount (non-negative).
    pub amount: f64,
    /// Transfer instant, UTC. Rows with an unparseable timestamp carry the
    /// Unix epoch sentinel.
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Account Profiles
// ============================================================================

/// Coarse account classification inferred from the account-id string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// A personal account.
    Individual,
    /// A business-looking account (name matches the business pattern).
    Business,
}

impl AccountType {
    /// Wire-format string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Individual => "individual",
            AccountType::Business => "business",
        }
    }
}

/// Per-account aggregates plus legitimacy flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    /// Account id.
    pub account_id: String,
    /// Regular payroll deposits from one dominant employer.
    pub is_payroll: bool,
    /// Many small inflows, fewer larger outflows, round-number pricing.
    pub is_merchant: bool,
    /// One large monthly deposit plus regular outgoing bills.
    pub is_salary: bool,
    /// Long history with diverse counterparties.
    pub is_established_business: bool,
    /// Coarse account classification.
    pub account_type: AccountType,
    /// Sum of all incoming amounts.
    pub total_inflow: f64,
    /// Sum of all outgoing amounts.
    pub total_outflow: f64,
    /// Incident transactions, counted with multiplicity.
    pub transaction_count: usize,
    /// Earliest incident timestamp.
    pub first_seen: DateTime<Utc>,
    /// Latest incident timestamp.
    pub last_seen: DateTime<Utc>,
}

// ============================================================================
// Detector Results
// ============================================================================

/// A temporally coherent simple cycle of length 3..=5.
///
/// Identified by the canonical rotation of `nodes`; never mutated after
/// detection except for the unified `ring_id` assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    /// Globally unique ring id, assigned by the scorer.
    pub ring_id: String,
    /// Ordered member accounts (all distinct).
    pub nodes: Vec<String>,
    /// Cycle length in nodes (equals `edge_count`).
    pub length: usize,
    /// Sum of every amount on the cycle's edges, rounded to 2 decimals.
    pub total_amount: f64,
    /// Max minus min edge timestamp, in hours, rounded to 2 decimals.
    pub time_span_hours: f64,
    /// Number of edges in the cycle.
    pub edge_count: usize,
}

/// Direction of a smurfing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanDirection {
    /// Many distinct senders into one receiver.
    FanIn,
    /// One sender out to many distinct receivers.
    FanOut,
}

impl FanDirection {
    /// Wire-format string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FanDirection::FanIn => "fan_in",
            FanDirection::FanOut => "fan_out",
        }
    }
}

/// A fan-in or fan-out structuring event. At most one per (account,
/// direction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmurfingResult {
    /// Globally unique ring id, assigned by the scorer.
    pub ring_id: String,
    /// The focal account.
    pub account_id: String,
    /// Event direction.
    pub direction: FanDirection,
    /// Unique counterparties in the best window.
    pub unique_counterparties: usize,
    /// Sum of amounts in the best window, rounded to 2 decimals.
    pub total_amount: f64,
    /// `total_amount / max(window hours, 1.0)`, rounded to 2 decimals.
    pub velocity_per_hour: f64,
    /// Timestamp of the first transaction in the best window.
    pub window_start: DateTime<Utc>,
    /// Timestamp of the last transaction in the best window.
    pub window_end: DateTime<Utc>,
}

/// A pass-through chain through low-activity intermediaries.
///
/// Identified by the exact chain sequence; chains are directed and
/// non-cyclic, so no rotation is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellResult {
    /// Globally unique ring id, assigned by the scorer.
    pub ring_id: String,
    /// Full ordered chain, source to sink (4..=7 nodes).
    pub chain: Vec<String>,
    /// Interior nodes of the chain.
    pub intermediate_accounts: Vec<String>,
    /// Sum of every amount on the chain's edges, rounded to 2 decimals.
    pub total_amount: f64,
    /// Number of intermediate accounts.
    pub shell_depth: usize,
}

// ============================================================================
// Scored Output
// ============================================================================

/// Pattern family a fraud ring belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Circular fund routing.
    Cycle,
    /// Fan-in smurfing.
    FanIn,
    /// Fan-out smurfing.
    FanOut,
    /// Shell network chain.
    Shell,
}

impl PatternType {
    /// Wire-format string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Cycle => "cycle",
            PatternType::FanIn => "fan_in",
            PatternType::FanOut => "fan_out",
            PatternType::Shell => "shell",
        }
    }
}

impl From<FanDirection> for PatternType {
    fn from(direction: FanDirection) -> Self {
        match direction {
            FanDirection::FanIn => PatternType::FanIn,
            FanDirection::FanOut => PatternType::FanOut,
        }
    }
}

/// An account with a positive suspicion score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousAccount {
    /// Account id.
    pub account_id: String,
    /// Final score in [0, 100], one decimal.
    pub suspicion_score: f64,
    /// Sorted pattern labels (`cycle_length_3`, `fan_in`, `high_velocity`, ...).
    pub detected_patterns: Vec<String>,
    /// First ring id, for single-ring consumers.
    pub ring_id: String,
    /// Coarse account classification.
    pub account_type: AccountType,
    /// Sum of all incoming amounts.
    pub total_inflow: f64,
    /// Sum of all outgoing amounts.
    pub total_outflow: f64,
    /// Incident transactions, counted with multiplicity.
    pub transaction_count: usize,
    /// Direct graph neighbours (successors and predecessors, self excluded).
    pub connected_accounts: Vec<String>,
    /// All rings this account participates in, sorted and deduplicated.
    pub ring_ids: Vec<String>,
}

/// A group of accounts implicated together by one detector event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudRing {
    /// Globally unique ring id (`RING_NNN`).
    pub ring_id: String,
    /// Member accounts, sorted and deduplicated.
    pub member_accounts: Vec<String>,
    /// Pattern family.
    pub pattern_type: PatternType,
    /// Maximum suspicion score over the members.
    pub risk_score: f64,
}

/// Batch-level counters and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Valid transactions in the batch.
    pub total_transactions: usize,
    /// Distinct accounts in the graph.
    pub total_accounts_analyzed: usize,
    /// Accounts with a positive suspicion score.
    pub suspicious_accounts_flagged: usize,
    /// Fraud rings across all detectors.
    pub fraud_rings_detected: usize,
    /// Temporally coherent cycles found.
    pub total_cycles: usize,
    /// Smurfing events found.
    pub total_smurfing_patterns: usize,
    /// Shell chains found.
    pub total_shell_patterns: usize,
    /// Sum of cycle and shell-chain amounts.
    pub total_amount_at_risk: f64,
    /// Wall-clock from start of parse to end of assembly, millisecond
    /// precision.
    pub processing_time_seconds: f64,
}

// ============================================================================
// Visualization Graph
// ============================================================================

/// A node in the visualization graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Account id.
    pub id: String,
    /// Display label (the account id).
    pub label: String,
    /// Coarse account classification.
    pub account_type: AccountType,
    /// Suspicion score, 0.0 when not scored.
    pub suspicion_score: f64,
    /// Sum of all incoming amounts.
    pub total_inflow: f64,
    /// Sum of all outgoing amounts.
    pub total_outflow: f64,
    /// Incident transactions, counted with multiplicity.
    pub transaction_count: usize,
    /// True iff `suspicion_score >= 25`.
    pub is_suspicious: bool,
    /// Rings this account participates in.
    pub ring_ids: Vec<String>,
    /// Report pattern labels (`cycle_length_3`, `high_velocity`, ...).
    pub detected_patterns: Vec<String>,
    /// Raw pattern family strings (`cycle`, `shell`, ...).
    pub patterns: Vec<String>,
}

/// An aggregated directed edge in the visualization graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Sending account id.
    pub source: String,
    /// Receiving account id.
    pub target: String,
    /// Total transferred amount over all parallel transfers.
    pub amount: f64,
    /// Number of parallel transfers.
    pub transaction_count: usize,
    /// True iff at least one endpoint has `suspicion_score >= 25`.
    pub is_suspicious: bool,
    /// Pattern family of the source account, if any.
    pub pattern_type: Option<PatternType>,
}

/// Visualization-ready graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    /// All accounts.
    pub nodes: Vec<GraphNode>,
    /// All aggregated directed edges.
    pub edges: Vec<GraphEdge>,
}

// ============================================================================
// Analysis Result
// ============================================================================

/// Lifecycle status of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Accepted, not yet started.
    Pending,
    /// Running.
    Processing,
    /// Finished successfully.
    Complete,
    /// Failed terminally.
    Error,
}

impl AnalysisStatus {
    /// Wire-format string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Complete => "complete",
            AnalysisStatus::Error => "error",
        }
    }
}

/// The complete output of one batch analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Batch-level counters and timing.
    pub summary: Summary,
    /// Accounts with a positive score, sorted by score descending
    /// (ties broken by account id).
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    /// Fraud rings, sorted by risk score descending.
    pub fraud_rings: Vec<FraudRing>,
    /// Visualization-ready graph.
    pub graph: GraphData,
}

// ============================================================================
// Rounding helpers
// ============================================================================

/// Round to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to three decimal places.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_strings() {
        assert_eq!(AnalysisStatus::Complete.as_str(), "complete");
        assert_eq!(AnalysisStatus::Error.as_str(), "error");
        assert_eq!(FanDirection::FanIn.as_str(), "fan_in");
        assert_eq!(PatternType::Shell.as_str(), "shell");
        assert_eq!(AccountType::Business.as_str(), "business");
    }

    #[test]
    fn test_serde_rename() {
        assert_eq!(
            serde_json::to_string(&PatternType::FanOut).unwrap(),
            "\"fan_out\""
        );
        assert_eq!(
            serde_json::to_string(&AnalysisStatus::Pending).unwrap(),
            "\"pending\""
        );
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round1(35.396), 35.4);
        assert_eq!(round2(4750.12345), 4750.12);
        assert_eq!(round3(1.23456), 1.235);
    }
}
