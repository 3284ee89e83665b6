//! Result assembly: batch summary and the forensic download report.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use muleflow_core::error::Result;

use crate::types::{
    round3, AnalysisResult, CycleResult, FraudRing, ShellResult, SmurfingResult, Summary,
    SuspiciousAccount,
};

/// Assemble the batch summary.
///
/// `elapsed` spans from the start of parsing to the end of assembly and
/// is recorded with millisecond precision.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn build_summary(
    total_transactions: usize,
    total_accounts: usize,
    suspicious: &[SuspiciousAccount],
    rings: &[FraudRing],
    cycles: &[CycleResult],
    smurfing: &[SmurfingResult],
    shells: &[ShellResult],
    elapsed: Duration,
) -> Summary {
    let amount_at_risk = cycles.iter().map(|c| c.total_amount).sum::<f64>()
        + shells.iter().map(|s| s.total_amount).sum::<f64>();

    Summary {
        total_transactions,
        total_accounts_analyzed: total_accounts,
        suspicious_accounts_flagged: suspicious.len(),
        fraud_rings_detected: rings.len(),
        total_cycles: cycles.len(),
        total_smurfing_patterns: smurfing.len(),
        total_shell_patterns: shells.len(),
        total_amount_at_risk: amount_at_risk,
        processing_time_seconds: round3(elapsed.as_secs_f64()),
    }
}

// ============================================================================
// Download report
// ============================================================================

/// One suspicious account in the download report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportAccount {
    /// Account id.
    pub account_id: String,
    /// Final score in [0, 100].
    pub suspicion_score: f64,
    /// Sorted pattern labels.
    pub detected_patterns: Vec<String>,
    /// First ring id.
    pub ring_id: String,
}

/// Summary section of the download report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Distinct accounts in the graph.
    pub total_accounts_analyzed: usize,
    /// Accounts with a positive suspicion score.
    pub suspicious_accounts_flagged: usize,
    /// Fraud rings across all detectors.
    pub fraud_rings_detected: usize,
    /// Wall-clock seconds, three decimals.
    pub processing_time_seconds: f64,
}

/// The strict three-field forensic report offered for download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadReport {
    /// Suspicious accounts, sorted by score descending.
    pub suspicious_accounts: Vec<ReportAccount>,
    /// Fraud rings, sorted by risk descending.
    pub fraud_rings: Vec<FraudRing>,
    /// Batch summary.
    pub summary: ReportSummary,
}

impl DownloadReport {
    /// Project a full analysis result onto the report document.
    #[must_use]
    pub fn from_result(result: &AnalysisResult) -> Self {
        DownloadReport {
            suspicious_accounts: result
                .suspicious_accounts
                .iter()
                .map(|account| ReportAccount {
                    account_id: account.account_id.clone(),
                    suspicion_score: account.suspicion_score,
                    detected_patterns: account.detected_patterns.clone(),
                    ring_id: account.ring_id.clone(),
                })
                .collect(),
            fraud_rings: result.fraud_rings.clone(),
            summary: ReportSummary {
                total_accounts_analyzed: result.summary.total_accounts_analyzed,
                suspicious_accounts_flagged: result.summary.suspicious_accounts_flagged,
                fraud_rings_detected: result.summary.fraud_rings_detected,
                processing_time_seconds: round3(result.summary.processing_time_seconds),
            },
        }
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GraphData, PatternType};

    fn sample_result() -> AnalysisResult {
        let accounts = vec![SuspiciousAccount {
            account_id: "A".to_string(),
            suspicion_score: 70.0,
            detected_patterns: vec!["cycle_length_3".to_string()],
            ring_id: "RING_001".to_string(),
            account_type: crate::types::AccountType::Individual,
            total_inflow: 4_900.0,
            total_outflow: 5_000.0,
            transaction_count: 2,
            connected_accounts: vec!["B".to_string(), "C".to_string()],
            ring_ids: vec!["RING_001".to_string()],
        }];
        let rings = vec![FraudRing {
            ring_id: "RING_001".to_string(),
            member_accounts: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            pattern_type: PatternType::Cycle,
            risk_score: 70.0,
        }];
        AnalysisResult {
            summary: Summary {
                total_transactions: 3,
                total_accounts_analyzed: 3,
                suspicious_accounts_flagged: 1,
                fraud_rings_detected: 1,
                total_cycles: 1,
                total_smurfing_patterns: 0,
                total_shell_patterns: 0,
                total_amount_at_risk: 14_850.0,
                processing_time_seconds: 0.0421,
            },
            suspicious_accounts: accounts,
            fraud_rings: rings,
            graph: GraphData::default(),
        }
    }

    #[test]
    fn test_report_has_exactly_three_top_level_fields() {
        let report = DownloadReport::from_result(&sample_result());
        let value: serde_json::Value =
            serde_json::from_str(&report.to_json().unwrap()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert!(object.contains_key("suspicious_accounts"));
        assert!(object.contains_key("fraud_rings"));
        assert!(object.contains_key("summary"));

        let summary = object["summary"].as_object().unwrap();
        assert_eq!(summary.len(), 4);
    }

    #[test]
    fn test_report_round_trip() {
        let report = DownloadReport::from_result(&sample_result());
        let json = report.to_json().unwrap();
        let reparsed: DownloadReport = serde_json::from_str(&json).unwrap();
        assert_eq!(reparsed, report);
        assert_eq!(reparsed.to_json().unwrap(), json);
    }

    #[test]
    fn test_seconds_rounded_to_three_decimals() {
        let report = DownloadReport::from_result(&sample_result());
        assert_eq!(report.summary.processing_time_seconds, 0.042);
    }

    #[test]
    fn test_summary_counters() {
        let summary = build_summary(
            10,
            6,
            &[],
            &[],
            &[],
            &[],
            &[],
            Duration::from_millis(1_234),
        );
        assert_eq!(summary.total_transactions, 10);
        assert_eq!(summary.total_accounts_analyzed, 6);
        assert_eq!(summary.suspicious_accounts_flagged, 0);
        assert_eq!(summary.processing_time_seconds, 1.234);
    }
}
