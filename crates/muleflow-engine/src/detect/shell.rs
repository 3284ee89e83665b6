//! Shell-network detector: pass-through chains.
//!
//! Enumerates source → ... → sink chains of 3..=6 edges whose interior
//! nodes are low-activity pass-throughs (at most 3 transactions, inflow
//! and outflow within a factor of two of each other). Per-source and
//! global chain caps bound the path enumeration.

use std::collections::HashSet;

use muleflow_core::config::ShellConfig;

use crate::graph::TransactionGraph;
use crate::types::{round2, ShellResult};

/// Pass-through ratio below which an intermediary is not a conduit.
const MIN_PASS_THROUGH_RATIO: f64 = 0.5;

/// Layered shell-network detection.
pub struct ShellDetector;

impl ShellDetector {
    /// Find pass-through chains from sources to sinks.
    #[must_use]
    pub fn detect(graph: &TransactionGraph, config: &ShellConfig) -> Vec<ShellResult> {
        // Low-activity nodes that could act as conduits.
        let shell_candidates: HashSet<&str> = graph
            .nodes()
            .iter()
            .filter(|(_, attr)| {
                attr.transaction_count >= 1
                    && attr.transaction_count <= config.max_intermediate_txns
            })
            .map(|(id, _)| id.as_str())
            .collect();
        if shell_candidates.is_empty() {
            return Vec::new();
        }

        let mut sources: Vec<&str> = Vec::new();
        let mut sinks: HashSet<&str> = HashSet::new();
        for id in graph.nodes().keys() {
            let in_degree = graph.in_degree(id);
            let out_degree = graph.out_degree(id);
            if in_degree == 0 || out_degree > in_degree {
                sources.push(id.as_str());
            }
            if out_degree == 0 || in_degree > out_degree {
                sinks.insert(id.as_str());
            }
        }
        if sources.is_empty() {
            sources = graph.nodes().keys().map(String::as_str).collect();
        }
        if sinks.is_empty() {
            sinks = graph.nodes().keys().map(String::as_str).collect();
        }
        sources.sort_unstable();

        let mut results = Vec::new();
        let mut seen_chains = HashSet::new();

        'sources: for source in sources {
            if results.len() >= config.max_paths {
                break;
            }

            let mut stack = vec![(source.to_string(), vec![source.to_string()])];
            let mut emitted_from_source = 0usize;

            while let Some((current, path)) = stack.pop() {
                if emitted_from_source >= config.max_paths_per_source {
                    break;
                }

                for next in graph.successors(&current) {
                    if path.contains(next) {
                        continue;
                    }

                    let mut chain = path.clone();
                    chain.push(next.clone());
                    let edges = chain.len() - 1;

                    if edges >= config.min_chain_edges && sinks.contains(next.as_str()) {
                        if let Some(result) =
                            validate_chain(graph, &chain, &shell_candidates, &mut seen_chains)
                        {
                            results.push(result);
                            emitted_from_source += 1;
                            if results.len() >= config.max_paths {
                                break 'sources;
                            }
                            if emitted_from_source >= config.max_paths_per_source {
                                break;
                            }
                        }
                    }

                    if edges < config.max_chain_edges {
                        stack.push((next.clone(), chain));
                    }
                }
            }
        }

        if results.len() >= config.max_paths {
            tracing::warn!(
                limit = config.max_paths,
                "shell chain budget exhausted, returning partial results"
            );
        }

        results
    }
}

/// Validate interiors and build the chain result.
fn validate_chain(
    graph: &TransactionGraph,
    chain: &[String],
    shell_candidates: &HashSet<&str>,
    seen_chains: &mut HashSet<String>,
) -> Option<ShellResult> {
    let interiors = &chain[1..chain.len() - 1];
    if interiors.is_empty() {
        return None;
    }

    for node in interiors {
        if !shell_candidates.contains(node.as_str()) {
            return None;
        }
    }

    let chain_key = chain.join("\u{2192}");
    if !seen_chains.insert(chain_key) {
        return None;
    }

    // Pass-through: each interior must move roughly what it receives.
    for node in interiors {
        let attr = graph.node(node)?;
        if attr.total_inflow <= 0.0 || attr.total_outflow <= 0.0 {
            return None;
        }
        let ratio = attr.total_inflow.min(attr.total_outflow)
            / attr.total_inflow.max(attr.total_outflow);
        if ratio < MIN_PASS_THROUGH_RATIO {
            return None;
        }
    }

    let mut total_amount = 0.0;
    for pair in chain.windows(2) {
        for txn in graph.edge_transactions(&pair[0], &pair[1]) {
            total_amount += txn.amount;
        }
    }

    Some(ShellResult {
        ring_id: String::new(),
        chain: chain.to_vec(),
        intermediate_accounts: interiors.to_vec(),
        total_amount: round2(total_amount),
        shell_depth: interiors.len(),
    })
}
