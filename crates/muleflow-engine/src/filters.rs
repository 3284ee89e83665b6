//! Legitimacy filters: false-positive reduction heuristics.
//!
//! Labels accounts that look like payroll, merchant, salary, or
//! established-business activity so the scorer can discount them. The
//! checks read the raw transaction lists, not the aggregated graph.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::graph::looks_like_business;
use crate::types::{AccountProfile, Transaction};

/// Merchant checks accept a wider set of business-name markers.
static BUSINESS_NAME_EXTENDED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(corp|inc|llc|ltd|co\b|merchant|store|shop|pay|bank|services|mart|pvt)")
        .unwrap()
});

/// Enrich every profile with the four legitimacy flags. Mutates the
/// profiles in place.
pub fn apply(profiles: &mut HashMap<String, AccountProfile>, transactions: &[Transaction]) {
    let mut incoming: HashMap<&str, Vec<&Transaction>> = HashMap::new();
    let mut outgoing: HashMap<&str, Vec<&Transaction>> = HashMap::new();
    for txn in transactions {
        incoming.entry(&txn.receiver).or_default().push(txn);
        outgoing.entry(&txn.sender).or_default().push(txn);
    }

    for (account_id, profile) in profiles.iter_mut() {
        let inc = incoming
            .get(account_id.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let out = outgoing
            .get(account_id.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        profile.is_payroll = is_payroll(inc);
        profile.is_merchant = is_merchant(account_id, inc, out);
        profile.is_salary = is_salary(inc, out);
        profile.is_established_business = is_established_business(account_id, inc, out);
    }
}

/// Payroll: one dominant sender, consistent amounts, monthly cadence.
fn is_payroll(inc: &[&Transaction]) -> bool {
    const AMOUNT_TOLERANCE: f64 = 0.10;
    const DOMINANT_RATIO: f64 = 0.80;

    if inc.len() < 3 {
        return false;
    }

    let mut sender_counts: HashMap<&str, usize> = HashMap::new();
    for txn in inc {
        *sender_counts.entry(&txn.sender).or_insert(0) += 1;
    }
    // Deterministic on count ties.
    let Some((dominant, count)) = sender_counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
    else {
        return false;
    };
    if (count as f64) / (inc.len() as f64) < DOMINANT_RATIO {
        return false;
    }

    let mut deposits: Vec<(DateTime<Utc>, f64)> = inc
        .iter()
        .filter(|txn| txn.sender == dominant)
        .map(|txn| (txn.timestamp, txn.amount))
        .collect();
    deposits.sort_by_key(|(ts, _)| *ts);
    if deposits.len() < 3 {
        return false;
    }

    let amounts: Vec<f64> = deposits.iter().map(|(_, amount)| *amount).collect();
    let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;
    if mean == 0.0 {
        return false;
    }
    let variance =
        amounts.iter().map(|a| (a - mean) * (a - mean)).sum::<f64>() / amounts.len() as f64;
    let cv = variance.sqrt() / mean;
    if cv > AMOUNT_TOLERANCE {
        return false;
    }

    let timestamps: Vec<DateTime<Utc>> = deposits.iter().map(|(ts, _)| *ts).collect();
    median_gap_days(&timestamps).is_some_and(is_monthly)
}

/// Merchant: business-looking name, or many small round-priced inflows
/// with fewer larger outflows.
fn is_merchant(account_id: &str, inc: &[&Transaction], out: &[&Transaction]) -> bool {
    const MIN_INFLOWS: usize = 20;
    const ROUND_RATIO: f64 = 0.3;

    if BUSINESS_NAME_EXTENDED.is_match(account_id) {
        return true;
    }
    if inc.len() < MIN_INFLOWS {
        return false;
    }

    let avg_in = inc.iter().map(|txn| txn.amount).sum::<f64>() / inc.len() as f64;
    let avg_out = if out.is_empty() {
        0.0
    } else {
        out.iter().map(|txn| txn.amount).sum::<f64>() / out.len() as f64
    };
    if avg_out <= avg_in {
        return false;
    }
    if inc.len() < 5 * out.len().max(1) {
        return false;
    }

    let round_count = inc.iter().filter(|txn| is_round_number(txn.amount)).count();
    (round_count as f64) / (inc.len() as f64) > ROUND_RATIO
}

/// Salary: a recurring large monthly deposit plus regular outgoing bills.
fn is_salary(inc: &[&Transaction], out: &[&Transaction]) -> bool {
    const LARGE_FRACTION: f64 = 0.7;
    const MIN_OUTFLOWS: usize = 3;

    if inc.len() < 2 {
        return false;
    }

    let max_amount = inc.iter().map(|txn| txn.amount).fold(0.0, f64::max);
    let mut large_deposits: Vec<DateTime<Utc>> = inc
        .iter()
        .filter(|txn| txn.amount > LARGE_FRACTION * max_amount)
        .map(|txn| txn.timestamp)
        .collect();
    if large_deposits.len() < 2 {
        return false;
    }
    large_deposits.sort();

    if !median_gap_days(&large_deposits).is_some_and(is_monthly) {
        return false;
    }

    out.len() >= MIN_OUTFLOWS
}

/// Established business: long history, diverse counterparties, and either
/// a business-looking name or high volume.
fn is_established_business(account_id: &str, inc: &[&Transaction], out: &[&Transaction]) -> bool {
    const MIN_ACTIVITY: usize = 20;
    const MIN_HISTORY_DAYS: f64 = 180.0;
    const MIN_COUNTERPARTIES: usize = 10;
    const HIGH_VOLUME: usize = 100;

    let total = inc.len() + out.len();
    if total < MIN_ACTIVITY {
        return false;
    }

    let mut min_ts: Option<DateTime<Utc>> = None;
    let mut max_ts: Option<DateTime<Utc>> = None;
    for txn in inc.iter().chain(out.iter()) {
        min_ts = Some(min_ts.map_or(txn.timestamp, |m| m.min(txn.timestamp)));
        max_ts = Some(max_ts.map_or(txn.timestamp, |m| m.max(txn.timestamp)));
    }
    let (Some(min_ts), Some(max_ts)) = (min_ts, max_ts) else {
        return false;
    };
    let history_days = (max_ts - min_ts).num_seconds() as f64 / 86_400.0;
    if history_days < MIN_HISTORY_DAYS {
        return false;
    }

    let mut counterparties: HashSet<&str> = HashSet::new();
    for txn in inc {
        counterparties.insert(&txn.sender);
    }
    for txn in out {
        counterparties.insert(&txn.receiver);
    }
    if counterparties.len() < MIN_COUNTERPARTIES {
        return false;
    }

    looks_like_business(account_id) || total > HIGH_VOLUME
}

/// Upper-median gap between consecutive timestamps, in days.
fn median_gap_days(sorted: &[DateTime<Utc>]) -> Option<f64> {
    if sorted.len() < 2 {
        return None;
    }
    let mut gaps: Vec<f64> = sorted
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_seconds() as f64 / 86_400.0)
        .collect();
    gaps.sort_by(f64::total_cmp);
    Some(gaps[gaps.len() / 2])
}

fn is_monthly(median_days: f64) -> bool {
    (25.0..=35.0).contains(&median_days)
}

/// Common retail price endings: .00, .49, .50, .95, .99.
fn is_round_number(amount: f64) -> bool {
    let cents = ((amount * 100.0).round() as i64).rem_euclid(100);
    matches!(cents, 0 | 49 | 50 | 95 | 99)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TransactionGraph;
    use chrono::TimeZone;

    fn txn_at(sender: &str, receiver: &str, amount: f64, day_offset: i64) -> Transaction {
        Transaction {
            transaction_id: None,
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
                + chrono::TimeDelta::days(day_offset),
        }
    }

    fn flagged(txns: &[Transaction]) -> HashMap<String, AccountProfile> {
        let graph = TransactionGraph::build(txns);
        let mut profiles = graph.build_profiles();
        apply(&mut profiles, txns);
        profiles
    }

    #[test]
    fn test_payroll_detected() {
        let txns = vec![
            txn_at("EMPLOYER_LLC", "emp", 50_000.0, 0),
            txn_at("EMPLOYER_LLC", "emp", 50_100.0, 30),
            txn_at("EMPLOYER_LLC", "emp", 49_900.0, 61),
            txn_at("EMPLOYER_LLC", "emp", 50_050.0, 92),
        ];
        let profiles = flagged(&txns);
        assert!(profiles["emp"].is_payroll);
    }

    #[test]
    fn test_payroll_rejected_on_irregular_amounts() {
        let txns = vec![
            txn_at("EMPLOYER_LLC", "emp", 50_000.0, 0),
            txn_at("EMPLOYER_LLC", "emp", 20_000.0, 30),
            txn_at("EMPLOYER_LLC", "emp", 80_000.0, 61),
        ];
        let profiles = flagged(&txns);
        assert!(!profiles["emp"].is_payroll, "CV far above 0.10");
    }

    #[test]
    fn test_payroll_rejected_on_weekly_cadence() {
        let txns = vec![
            txn_at("EMPLOYER_LLC", "emp", 10_000.0, 0),
            txn_at("EMPLOYER_LLC", "emp", 10_000.0, 7),
            txn_at("EMPLOYER_LLC", "emp", 10_000.0, 14),
            txn_at("EMPLOYER_LLC", "emp", 10_000.0, 21),
        ];
        let profiles = flagged(&txns);
        assert!(!profiles["emp"].is_payroll, "weekly is not monthly");
    }

    #[test]
    fn test_payroll_rejected_on_mixed_senders() {
        let txns = vec![
            txn_at("A", "emp", 10_000.0, 0),
            txn_at("B", "emp", 10_000.0, 30),
            txn_at("C", "emp", 10_000.0, 60),
            txn_at("D", "emp", 10_000.0, 90),
        ];
        let profiles = flagged(&txns);
        assert!(!profiles["emp"].is_payroll, "no dominant sender");
    }

    #[test]
    fn test_merchant_by_name() {
        let txns = vec![txn_at("alice", "SUPERMART", 12.49, 0)];
        let profiles = flagged(&txns);
        assert!(profiles["SUPERMART"].is_merchant);
    }

    #[test]
    fn test_merchant_by_statistics() {
        // 25 round-priced small inflows, 2 larger outflows.
        let mut txns: Vec<Transaction> = (0..25)
            .map(|i| txn_at(&format!("cust{i}"), "vendor", 19.99, i))
            .collect();
        txns.push(txn_at("vendor", "supplier_a", 200.0, 26));
        txns.push(txn_at("vendor", "supplier_b", 180.0, 27));

        let profiles = flagged(&txns);
        assert!(profiles["vendor"].is_merchant);
    }

    #[test]
    fn test_merchant_rejected_without_round_prices() {
        let mut txns: Vec<Transaction> = (0..25)
            .map(|i| txn_at(&format!("cust{i}"), "vendor", 17.23, i))
            .collect();
        txns.push(txn_at("vendor", "supplier", 300.0, 26));

        let profiles = flagged(&txns);
        assert!(!profiles["vendor"].is_merchant);
    }

    #[test]
    fn test_salary_detected() {
        let mut txns = vec![
            txn_at("EMPLOYER", "worker", 60_000.0, 0),
            txn_at("EMPLOYER", "worker", 60_000.0, 30),
            txn_at("other", "worker", 500.0, 10),
        ];
        txns.push(txn_at("worker", "landlord", 15_000.0, 2));
        txns.push(txn_at("worker", "utility_a", 2_000.0, 5));
        txns.push(txn_at("worker", "utility_b", 1_000.0, 8));

        let profiles = flagged(&txns);
        assert!(profiles["worker"].is_salary);
    }

    #[test]
    fn test_salary_needs_outgoing_bills() {
        let txns = vec![
            txn_at("EMPLOYER", "worker", 60_000.0, 0),
            txn_at("EMPLOYER", "worker", 60_000.0, 30),
        ];
        let profiles = flagged(&txns);
        assert!(!profiles["worker"].is_salary);
    }

    #[test]
    fn test_established_business() {
        // 24 transfers over a year with 12 distinct counterparties.
        let mut txns = Vec::new();
        for i in 0..12 {
            txns.push(txn_at(&format!("client{i}"), "GLOBAL_SERVICES", 1_000.0, i * 30));
            txns.push(txn_at("GLOBAL_SERVICES", &format!("supplier{i}"), 800.0, i * 30 + 5));
        }
        let profiles = flagged(&txns);
        assert!(profiles["GLOBAL_SERVICES"].is_established_business);
    }

    #[test]
    fn test_established_rejected_on_short_history() {
        let mut txns = Vec::new();
        for i in 0..12 {
            txns.push(txn_at(&format!("client{i}"), "GLOBAL_SERVICES", 1_000.0, i));
            txns.push(txn_at("GLOBAL_SERVICES", &format!("supplier{i}"), 800.0, i));
        }
        let profiles = flagged(&txns);
        assert!(
            !profiles["GLOBAL_SERVICES"].is_established_business,
            "twelve days of history is not six months"
        );
    }

    #[test]
    fn test_round_number_endings() {
        assert!(is_round_number(100.00));
        assert!(is_round_number(19.99));
        assert!(is_round_number(4.95));
        assert!(is_round_number(12.49));
        assert!(is_round_number(7.50));
        assert!(!is_round_number(17.23));
    }
}
