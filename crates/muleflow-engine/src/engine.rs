//! Pipeline orchestration.
//!
//! Parse → build graph and time index in parallel → run the three
//! detectors concurrently against the immutable graph → legitimacy
//! filters → scorer → result assembly. The detectors form a
//! fan-out/fan-in with a join-all barrier; none of them holds a lock.

use std::time::Instant;

use muleflow_core::config::EngineConfig;
use muleflow_core::error::Result;

use crate::detect::{CycleDetector, ShellDetector, SmurfingDetector};
use crate::graph::TransactionGraph;
use crate::timeindex::TimeIndex;
use crate::types::AnalysisResult;
use crate::{filters, parser, report, scoring};

/// The batch analysis engine: a pure function from CSV bytes to an
/// [`AnalysisResult`].
pub struct AnalysisEngine;

impl AnalysisEngine {
    /// Run the full pipeline on one CSV batch.
    pub fn analyze(csv_bytes: &[u8], config: &EngineConfig) -> Result<AnalysisResult> {
        let started = Instant::now();

        let transactions = parser::parse(csv_bytes, config.max_input_bytes)?;
        tracing::info!(transactions = transactions.len(), "parsed batch");

        let (graph, index) = rayon::join(
            || TransactionGraph::build(&transactions),
            || TimeIndex::build(&transactions),
        );
        tracing::debug!(
            accounts = graph.node_count(),
            edges = graph.aggregated_edges().len(),
            "graph built"
        );

        let (mut cycles, (mut smurfing, mut shells)) = rayon::join(
            || CycleDetector::detect(&graph, &config.cycle),
            || {
                rayon::join(
                    || SmurfingDetector::detect(&transactions, &index, &config.smurfing),
                    || ShellDetector::detect(&graph, &config.shell),
                )
            },
        );
        tracing::info!(
            cycles = cycles.len(),
            smurfing = smurfing.len(),
            shells = shells.len(),
            "detectors finished"
        );

        scoring::assign_ring_ids(&mut cycles, &mut smurfing, &mut shells);

        let mut profiles = graph.build_profiles();
        filters::apply(&mut profiles, &transactions);

        let scores = scoring::calculate_scores(&profiles, &cycles, &smurfing, &shells);
        let maps = scoring::build_pattern_maps(&cycles, &smurfing, &shells);

        let suspicious_accounts =
            scoring::build_suspicious_accounts(&scores, &profiles, &maps, &graph);
        let fraud_rings = scoring::build_fraud_rings(&scores, &cycles, &smurfing, &shells);
        let graph_data =
            graph.build_visualization(&scores, &maps.ring_map, &maps.raw_patterns, &maps.labels);

        let summary = report::build_summary(
            transactions.len(),
            graph.node_count(),
            &suspicious_accounts,
            &fraud_rings,
            &cycles,
            &smurfing,
            &shells,
            started.elapsed(),
        );
        tracing::info!(
            suspicious = summary.suspicious_accounts_flagged,
            rings = summary.fraud_rings_detected,
            seconds = summary.processing_time_seconds,
            "analysis complete"
        );

        Ok(AnalysisResult {
            summary,
            suspicious_accounts,
            fraud_rings,
            graph: graph_data,
        })
    }
}
