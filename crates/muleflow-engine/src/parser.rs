//! CSV batch parser.
//!
//! Recognizes the logical columns `sender`, `receiver`, `amount`,
//! `timestamp` (plus optional `transaction_id`) under their accepted
//! aliases, tolerates currency symbols and thousands separators in
//! amounts, and tries five timestamp formats in order. Malformed rows are
//! skipped silently; batch-level problems (missing header, missing
//! required column, zero valid rows) fail the whole batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

use muleflow_core::error::{AnalysisError, Result};

use crate::types::Transaction;

const REQUIRED_COLUMNS: [&str; 4] = ["sender", "receiver", "amount", "timestamp"];

/// Map a header cell to its canonical column name.
fn canonical_column(header: &str) -> Option<&'static str> {
    match header {
        "sender" | "sender_id" | "from" | "source" | "src" => Some("sender"),
        "receiver" | "receiver_id" | "to" | "target" | "dst" => Some("receiver"),
        "amount" | "value" | "txn_amount" => Some("amount"),
        "timestamp" | "date" | "datetime" | "time" => Some("timestamp"),
        "transaction_id" => Some("transaction_id"),
        _ => None,
    }
}

/// Parse a timestamp string, trying each accepted format in order.
///
/// Returns `None` when no format matches; the caller substitutes the
/// Unix-epoch sentinel.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    const DATETIME_FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

/// Parse an amount cell after stripping everything outside `[0-9.-]`.
///
/// Returns `None` for empty, unparseable, or negative results.
fn parse_amount(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let amount: f64 = cleaned.parse().ok()?;
    if amount < 0.0 {
        return None;
    }
    Some(amount)
}

/// Parse a CSV byte buffer into a validated transaction batch.
///
/// `max_bytes` caps the accepted body size.
pub fn parse(bytes: &[u8], max_bytes: usize) -> Result<Vec<Transaction>> {
    if bytes.is_empty() {
        return Err(AnalysisError::invalid_input("empty CSV content"));
    }
    if bytes.len() > max_bytes {
        return Err(AnalysisError::invalid_input(format!(
            "CSV body of {} bytes exceeds the {} byte limit",
            bytes.len(),
            max_bytes
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AnalysisError::invalid_input(format!("no header row found: {e}")))?
        .clone();
    if headers.is_empty() {
        return Err(AnalysisError::invalid_input("no header row found"));
    }

    // First occurrence of each canonical column wins.
    let mut columns: HashMap<&'static str, usize> = HashMap::new();
    for (i, header) in headers.iter().enumerate() {
        if let Some(canonical) = canonical_column(header.trim().to_lowercase().as_str()) {
            columns.entry(canonical).or_insert(i);
        }
    }

    for required in REQUIRED_COLUMNS {
        if !columns.contains_key(required) {
            return Err(AnalysisError::invalid_input(format!(
                "missing required column: {required}"
            )));
        }
    }

    let sender_idx = columns["sender"];
    let receiver_idx = columns["receiver"];
    let amount_idx = columns["amount"];
    let timestamp_idx = columns["timestamp"];
    let txn_id_idx = columns.get("transaction_id").copied();

    let mut transactions = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let Ok(record) = record else {
            skipped += 1;
            continue;
        };
        if record.is_empty() || (record.len() == 1 && record[0].is_empty()) {
            continue;
        }

        let (Some(sender), Some(receiver), Some(amount_raw), Some(timestamp_raw)) = (
            record.get(sender_idx),
            record.get(receiver_idx),
            record.get(amount_idx),
            record.get(timestamp_idx),
        ) else {
            skipped += 1;
            continue;
        };

        if sender.is_empty() || receiver.is_empty() {
            skipped += 1;
            continue;
        }

        let Some(amount) = parse_amount(amount_raw) else {
            skipped += 1;
            continue;
        };

        let timestamp = parse_timestamp(timestamp_raw).unwrap_or(DateTime::UNIX_EPOCH);

        let transaction_id = txn_id_idx
            .and_then(|i| record.get(i))
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        transactions.push(Transaction {
            transaction_id,
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            timestamp,
        });
    }

    if skipped > 0 {
        tracing::debug!(skipped, kept = transactions.len(), "skipped malformed rows");
    }

    if transactions.is_empty() {
        return Err(AnalysisError::no_data("no valid transactions found in CSV"));
    }

    Ok(transactions)
}
