//! Directed multigraph of accounts and transfers.
//!
//! Built once from the validated batch and read-only afterwards; all
//! detectors read it concurrently without locks. Adjacency sets are
//! ordered so traversals are deterministic run to run.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

use crate::types::{
    AccountProfile, AccountType, GraphData, GraphEdge, GraphNode, PatternType, Transaction,
};

/// Business-looking account-id pattern, compiled once.
static BUSINESS_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(corp|inc|llc|ltd|co\b|merchant|store|shop|pay|bank|services)").unwrap()
});

static EMPTY_SET: BTreeSet<String> = BTreeSet::new();

/// Heuristic: does this account id look like a business name?
pub(crate) fn looks_like_business(account_id: &str) -> bool {
    BUSINESS_NAME.is_match(account_id)
}

// ============================================================================
// Node and edge attributes
// ============================================================================

/// Aggregates for one account node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAttr {
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

/// Aggregates for one ordered account pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedEdge {
    /// Total transferred amount.
    pub total_amount: f64,
    /// Number of parallel transfers.
    pub transaction_count: usize,
    /// Earliest transfer timestamp.
    pub earliest: DateTime<Utc>,
    /// Latest transfer timestamp.
    pub latest: DateTime<Utc>,
}

/// One transfer on a multi-edge, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeTxn {
    /// Transfer amount.
    pub amount: f64,
    /// Transfer timestamp.
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Transaction graph
// ============================================================================

/// Directed multigraph of accounts.
#[derive(Debug, Default)]
pub struct TransactionGraph {
    nodes: HashMap<String, NodeAttr>,
    agg_edges: HashMap<(String, String), AggregatedEdge>,
    adj: HashMap<String, BTreeSet<String>>,
    rev_adj: HashMap<String, BTreeSet<String>>,
    edge_txns: HashMap<(String, String), Vec<EdgeTxn>>,
}

impl TransactionGraph {
    /// Build the graph from a validated batch.
    #[must_use]
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut graph = TransactionGraph::default();

        for txn in transactions {
            graph.touch_node(&txn.sender, txn.timestamp, |attr| {
                attr.total_outflow += txn.amount;
            });
            graph.touch_node(&txn.receiver, txn.timestamp, |attr| {
                attr.total_inflow += txn.amount;
            });

            let key = (txn.sender.clone(), txn.receiver.clone());
            let agg = graph
                .agg_edges
                .entry(key.clone())
                .or_insert(AggregatedEdge {
                    total_amount: 0.0,
                    transaction_count: 0,
                    earliest: txn.timestamp,
                    latest: txn.timestamp,
                });
            agg.total_amount += txn.amount;
            agg.transaction_count += 1;
            agg.earliest = agg.earliest.min(txn.timestamp);
            agg.latest = agg.latest.max(txn.timestamp);

            graph
                .adj
                .entry(txn.sender.clone())
                .or_default()
                .insert(txn.receiver.clone());
            graph
                .rev_adj
                .entry(txn.receiver.clone())
                .or_default()
                .insert(txn.sender.clone());

            graph.edge_txns.entry(key).or_default().push(EdgeTxn {
                amount: txn.amount,
                timestamp: txn.timestamp,
            });
        }

        graph
    }

    fn touch_node(
        &mut self,
        account_id: &str,
        timestamp: DateTime<Utc>,
        update: impl FnOnce(&mut NodeAttr),
    ) {
        let attr = self
            .nodes
            .entry(account_id.to_string())
            .or_insert(NodeAttr {
                total_inflow: 0.0,
                total_outflow: 0.0,
                transaction_count: 0,
                first_seen: timestamp,
                last_seen: timestamp,
            });
        attr.transaction_count += 1;
        attr.first_seen = attr.first_seen.min(timestamp);
        attr.last_seen = attr.last_seen.max(timestamp);
        update(attr);
    }

    // ── Node accessors ────────────────────────────────────────────────

    /// All account nodes with their aggregates.
    #[must_use]
    pub fn nodes(&self) -> &HashMap<String, NodeAttr> {
        &self.nodes
    }

    /// Whether the account appears in the graph.
    #[must_use]
    pub fn has_node(&self, account_id: &str) -> bool {
        self.nodes.contains_key(account_id)
    }

    /// Aggregates for one account.
    #[must_use]
    pub fn node(&self, account_id: &str) -> Option<&NodeAttr> {
        self.nodes.get(account_id)
    }

    /// Number of distinct accounts.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ── Adjacency ─────────────────────────────────────────────────────

    /// Accounts this account has sent to, in sorted order.
    #[must_use]
    pub fn successors(&self, account_id: &str) -> &BTreeSet<String> {
        self.adj.get(account_id).unwrap_or(&EMPTY_SET)
    }

    /// Accounts that have sent to this account, in sorted order.
    #[must_use]
    pub fn predecessors(&self, account_id: &str) -> &BTreeSet<String> {
        self.rev_adj.get(account_id).unwrap_or(&EMPTY_SET)
    }

    /// Number of distinct counterparties this account has sent to.
    #[must_use]
    pub fn out_degree(&self, account_id: &str) -> usize {
        self.successors(account_id).len()
    }

    /// Number of distinct counterparties that have sent to this account.
    #[must_use]
    pub fn in_degree(&self, account_id: &str) -> usize {
        self.predecessors(account_id).len()
    }

    // ── Edges ─────────────────────────────────────────────────────────

    /// Parallel transfers on the `(sender, receiver)` pair, insertion
    /// order.
    #[must_use]
    pub fn edge_transactions(&self, sender: &str, receiver: &str) -> &[EdgeTxn] {
        self.edge_txns
            .get(&(sender.to_string(), receiver.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Aggregates for the `(sender, receiver)` pair.
    #[must_use]
    pub fn aggregated_edge(&self, sender: &str, receiver: &str) -> Option<&AggregatedEdge> {
        self.agg_edges
            .get(&(sender.to_string(), receiver.to_string()))
    }

    /// All aggregated edges keyed by ordered pair.
    #[must_use]
    pub fn aggregated_edges(&self) -> &HashMap<(String, String), AggregatedEdge> {
        &self.agg_edges
    }

    // ── Derived artifacts ─────────────────────────────────────────────

    /// Build the pre-filter account profiles.
    #[must_use]
    pub fn build_profiles(&self) -> HashMap<String, AccountProfile> {
        self.nodes
            .iter()
            .map(|(id, attr)| {
                let account_type = if looks_like_business(id) {
                    AccountType::Business
                } else {
                    AccountType::Individual
                };
                (
                    id.clone(),
                    AccountProfile {
                        account_id: id.clone(),
                        is_payroll: false,
                        is_merchant: false,
                        is_salary: false,
                        is_established_business: false,
                        account_type,
                        total_inflow: attr.total_inflow,
                        total_outflow: attr.total_outflow,
                        transaction_count: attr.transaction_count,
                        first_seen: attr.first_seen,
                        last_seen: attr.last_seen,
                    },
                )
            })
            .collect()
    }

    /// Build the visualization graph.
    ///
    /// A node or edge is suspicious iff the score (of the node, or of at
    /// least one endpoint) is at least 25.
    #[must_use]
    pub fn build_visualization(
        &self,
        scores: &HashMap<String, f64>,
        ring_map: &HashMap<String, Vec<String>>,
        raw_patterns: &HashMap<String, Vec<PatternType>>,
        labels: &HashMap<String, BTreeSet<String>>,
    ) -> GraphData {
        const SUSPICIOUS_THRESHOLD: f64 = 25.0;

        let mut nodes: Vec<GraphNode> = self
            .nodes
            .iter()
            .map(|(id, attr)| {
                let score = scores.get(id).copied().unwrap_or(0.0);
                let account_type = if looks_like_business(id) {
                    AccountType::Business
                } else {
                    AccountType::Individual
                };
                GraphNode {
                    id: id.clone(),
                    label: id.clone(),
                    account_type,
                    suspicion_score: score,
                    total_inflow: attr.total_inflow,
                    total_outflow: attr.total_outflow,
                    transaction_count: attr.transaction_count,
                    is_suspicious: score >= SUSPICIOUS_THRESHOLD,
                    ring_ids: ring_map.get(id).cloned().unwrap_or_default(),
                    detected_patterns: labels
                        .get(id)
                        .map(|set| set.iter().cloned().collect())
                        .unwrap_or_default(),
                    patterns: raw_patterns
                        .get(id)
                        .map(|kinds| kinds.iter().map(|p| p.as_str().to_string()).collect())
                        .unwrap_or_default(),
                }
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<GraphEdge> = self
            .agg_edges
            .iter()
            .map(|((source, target), agg)| {
                let source_score = scores.get(source).copied().unwrap_or(0.0);
                let target_score = scores.get(target).copied().unwrap_or(0.0);
                GraphEdge {
                    source: source.clone(),
                    target: target.clone(),
                    amount: agg.total_amount,
                    transaction_count: agg.transaction_count,
                    is_suspicious: source_score >= SUSPICIOUS_THRESHOLD
                        || target_score >= SUSPICIOUS_THRESHOLD,
                    pattern_type: raw_patterns
                        .get(source)
                        .and_then(|kinds| kinds.first().copied()),
                }
            })
            .collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

        GraphData { nodes, edges }
    }
}
