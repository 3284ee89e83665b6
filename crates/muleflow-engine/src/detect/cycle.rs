//! Cycle detector: temporally coherent circular fund routing.
//!
//! Enumerates simple directed cycles of length 3..=5 whose edge
//! timestamps all fit inside one temporal window. Explicit-stack DFS with
//! O(1) path membership, a per-root frame budget against dense-graph
//! blowup, and hub-first root ordering so high-centrality accounts are
//! explored before any budget runs out.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;

use muleflow_core::config::CycleConfig;

use crate::graph::TransactionGraph;
use crate::types::{round2, CycleResult};

const MIN_CYCLE_LENGTH: usize = 3;

/// DFS frame: current node plus the path that reached it.
struct Frame {
    node: String,
    path: Vec<String>,
    in_path: HashSet<String>,
}

/// Temporally coherent cycle enumeration.
pub struct CycleDetector;

impl CycleDetector {
    /// Find all simple cycles of length 3..=`max_length` whose edge
    /// timestamps fit within the configured window.
    #[must_use]
    pub fn detect(graph: &TransactionGraph, config: &CycleConfig) -> Vec<CycleResult> {
        let window = hours_to_delta(config.window_hours);

        // Hubs first: more cycles found before any budget is exhausted.
        let mut roots: Vec<&String> = graph
            .nodes()
            .keys()
            .filter(|id| graph.out_degree(id) > 0)
            .collect();
        roots.sort_by(|a, b| {
            graph
                .out_degree(b)
                .cmp(&graph.out_degree(a))
                .then_with(|| a.cmp(b))
        });

        let mut results = Vec::new();
        let mut seen = HashSet::new();

        'roots: for start in roots {
            if results.len() >= config.max_cycles {
                break;
            }

            let mut stack = vec![Frame {
                node: start.clone(),
                path: vec![start.clone()],
                in_path: HashSet::from([start.clone()]),
            }];
            let mut frames_this_root = 0usize;

            while let Some(frame) = stack.pop() {
                frames_this_root += 1;
                if frames_this_root > config.max_frames_per_root {
                    tracing::debug!(root = %start, "frame budget exhausted for root");
                    break;
                }

                let depth = frame.path.len();
                for next in graph.successors(&frame.node) {
                    if next == start && depth >= MIN_CYCLE_LENGTH {
                        if let Some(cycle) = close_cycle(graph, &frame.path, window) {
                            if seen.insert(canonical_key(&cycle.nodes)) {
                                results.push(cycle);
                                if results.len() >= config.max_cycles {
                                    break 'roots;
                                }
                            }
                        }
                        continue;
                    }

                    if depth < config.max_length && !frame.in_path.contains(next) {
                        let mut path = frame.path.clone();
                        let mut in_path = frame.in_path.clone();
                        path.push(next.clone());
                        in_path.insert(next.clone());
                        stack.push(Frame {
                            node: next.clone(),
                            path,
                            in_path,
                        });
                    }
                }
            }
        }

        if results.len() >= config.max_cycles {
            tracing::warn!(
                limit = config.max_cycles,
                "cycle budget exhausted, returning partial results"
            );
        }

        results
    }
}

/// Validate temporal coherence of a closed path and build its result.
///
/// Every transfer on every hop contributes to the span and the total; the
/// cycle is accepted iff the span fits in the window.
fn close_cycle(
    graph: &TransactionGraph,
    path: &[String],
    window: TimeDelta,
) -> Option<CycleResult> {
    let length = path.len();
    let mut min_ts: Option<DateTime<Utc>> = None;
    let mut max_ts: Option<DateTime<Utc>> = None;
    let mut total_amount = 0.0;

    for i in 0..length {
        let u = &path[i];
        let v = &path[(i + 1) % length];
        let txns = graph.edge_transactions(u, v);
        if txns.is_empty() {
            return None;
        }
        for txn in txns {
            total_amount += txn.amount;
            min_ts = Some(min_ts.map_or(txn.timestamp, |m| m.min(txn.timestamp)));
            max_ts = Some(max_ts.map_or(txn.timestamp, |m| m.max(txn.timestamp)));
        }
    }

    let span = max_ts? - min_ts?;
    if span > window {
        return None;
    }

    let span_hours = span.num_milliseconds() as f64 / 3_600_000.0;
    Some(CycleResult {
        ring_id: String::new(),
        nodes: path.to_vec(),
        length,
        total_amount: round2(total_amount),
        time_span_hours: round2(span_hours),
        edge_count: length,
    })
}

/// Lexicographically smallest comma-joined rotation of the node list.
fn canonical_key(nodes: &[String]) -> String {
    let length = nodes.len();
    (0..length)
        .map(|start| {
            (0..length)
                .map(|i| nodes[(start + i) % length].as_str())
                .collect::<Vec<_>>()
                .join(",")
        })
        .min()
        .unwrap_or_default()
}

fn hours_to_delta(hours: f64) -> TimeDelta {
    TimeDelta::milliseconds((hours * 3_600_000.0).round() as i64)
}
