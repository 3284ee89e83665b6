//! Smurfing detector: fan-in / fan-out structuring.
//!
//! Flags accounts that concentrate at least `fan_threshold` distinct
//! counterparties inside one sliding window. One global timestamp sort
//! (via the [`TimeIndex`]) plus a linear two-pointer window per account
//! keeps the whole pass at O(N log N).
//!
//! [`TimeIndex`]: crate::timeindex::TimeIndex

use chrono::TimeDelta;
use std::collections::HashMap;

use muleflow_core::config::SmurfingConfig;

use crate::timeindex::TimeIndex;
use crate::types::{round2, FanDirection, SmurfingResult, Transaction};

/// Fan-in / fan-out structuring detection.
pub struct SmurfingDetector;

impl SmurfingDetector {
    /// Detect fan-in and fan-out events over the batch.
    #[must_use]
    pub fn detect(
        transactions: &[Transaction],
        index: &TimeIndex,
        config: &SmurfingConfig,
    ) -> Vec<SmurfingResult> {
        if transactions.is_empty() {
            return Vec::new();
        }

        let sorted: Vec<usize> = index.in_order().collect();
        let window =
            TimeDelta::milliseconds((config.window_hours * 3_600_000.0).round() as i64);

        let mut results = detect_fan(transactions, &sorted, config, window, FanDirection::FanIn);
        results.extend(detect_fan(
            transactions,
            &sorted,
            config,
            window,
            FanDirection::FanOut,
        ));
        results
    }
}

/// The account a window is centered on.
fn focal(txn: &Transaction, direction: FanDirection) -> &str {
    match direction {
        FanDirection::FanIn => &txn.receiver,
        FanDirection::FanOut => &txn.sender,
    }
}

/// The account on the other side of a transfer.
fn counterparty(txn: &Transaction, direction: FanDirection) -> &str {
    match direction {
        FanDirection::FanIn => &txn.sender,
        FanDirection::FanOut => &txn.receiver,
    }
}

/// Slide a two-pointer window over each focal account's transactions,
/// maintaining counterparty multiplicities for O(1) unique-count updates.
fn detect_fan(
    transactions: &[Transaction],
    sorted: &[usize],
    config: &SmurfingConfig,
    window: TimeDelta,
    direction: FanDirection,
) -> Vec<SmurfingResult> {
    // Bucket indices per focal account; buckets inherit timestamp order.
    let mut buckets: HashMap<&str, Vec<usize>> = HashMap::new();
    for &i in sorted {
        buckets
            .entry(focal(&transactions[i], direction))
            .or_default()
            .push(i);
    }

    let mut accounts: Vec<&str> = buckets.keys().copied().collect();
    accounts.sort_unstable();

    let mut results = Vec::new();

    for account in accounts {
        let indices = &buckets[account];
        if indices.len() < config.fan_threshold {
            continue;
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut unique = 0usize;
        let mut total = 0.0f64;

        let mut best_unique = 0usize;
        let mut best_left = 0usize;
        let mut best_right = 0usize;
        let mut best_total = 0.0f64;

        let mut left = 0usize;
        for right in 0..indices.len() {
            let rt = &transactions[indices[right]];
            let count = counts.entry(counterparty(rt, direction)).or_insert(0);
            if *count == 0 {
                unique += 1;
            }
            *count += 1;
            total += rt.amount;

            while left < right && rt.timestamp - transactions[indices[left]].timestamp > window {
                let lt = &transactions[indices[left]];
                if let Some(count) = counts.get_mut(counterparty(lt, direction)) {
                    *count -= 1;
                    if *count == 0 {
                        unique -= 1;
                    }
                }
                total -= lt.amount;
                left += 1;
            }

            // >= keeps the most recent window on ties.
            if unique >= best_unique {
                best_unique = unique;
                best_left = left;
                best_right = right;
                best_total = total;
            }
        }

        if best_unique >= config.fan_threshold {
            let window_start = transactions[indices[best_left]].timestamp;
            let window_end = transactions[indices[best_right]].timestamp;
            let span_hours =
                ((window_end - window_start).num_milliseconds() as f64 / 3_600_000.0).max(1.0);

            results.push(SmurfingResult {
                ring_id: String::new(),
                account_id: account.to_string(),
                direction,
                unique_counterparties: best_unique,
                total_amount: round2(best_total),
                velocity_per_hour: round2(best_total / span_hours),
                window_start,
                window_end,
            });
        }
    }

    results
}
