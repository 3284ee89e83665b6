//! Rule-based scorer: decision-tree scoring, ring-id unification, and
//! assembly of suspicious accounts and fraud rings.
//!
//! Each detector family contributes at most its strongest record per
//! account; legitimacy flags subtract; the result clamps to [0, 100].
//! Ring identifiers are renumbered into one global `RING_NNN` sequence:
//! cycles first, then smurfing events, then shell chains.

use std::collections::{BTreeSet, HashMap};

use crate::graph::TransactionGraph;
use crate::types::{
    round1, AccountProfile, CycleResult, FraudRing, PatternType, ShellResult, SmurfingResult,
    SuspiciousAccount,
};

const HIGH_VELOCITY_PER_HOUR: f64 = 5_000.0;

/// Renumber detector-local ring ids into one global sequence.
pub fn assign_ring_ids(
    cycles: &mut [CycleResult],
    smurfing: &mut [SmurfingResult],
    shells: &mut [ShellResult],
) {
    let mut counter = 0usize;
    let mut next = || {
        counter += 1;
        format!("RING_{counter:03}")
    };

    for cycle in cycles.iter_mut() {
        cycle.ring_id = next();
    }
    for event in smurfing.iter_mut() {
        event.ring_id = next();
    }
    for shell in shells.iter_mut() {
        shell.ring_id = next();
    }
}

/// Compute the suspicion score for every account.
///
/// Returns one entry per profiled account, including zeros.
pub fn calculate_scores(
    profiles: &HashMap<String, AccountProfile>,
    cycles: &[CycleResult],
    smurfing: &[SmurfingResult],
    shells: &[ShellResult],
) -> HashMap<String, f64> {
    // Strongest record per family per account.
    //
    // Cycles: shorter loops score higher, 20 * (6 - length), +10 for
    // totals above 10k.
    let mut cycle_scores: HashMap<&str, f64> = HashMap::new();
    for cycle in cycles {
        let mut score = 20.0 * (6.0 - cycle.length.min(5) as f64);
        if cycle.total_amount > 10_000.0 {
            score += 10.0;
        }
        for node in &cycle.nodes {
            let entry = cycle_scores.entry(node).or_insert(0.0);
            *entry = entry.max(score);
        }
    }

    // Smurfing: base 25, +10 high velocity, +5 many counterparties,
    // +5 high volume.
    let mut smurf_scores: HashMap<&str, f64> = HashMap::new();
    for event in smurfing {
        let mut score = 25.0;
        if event.velocity_per_hour > HIGH_VELOCITY_PER_HOUR {
            score += 10.0;
        }
        if event.unique_counterparties > 20 {
            score += 5.0;
        }
        if event.total_amount > 100_000.0 {
            score += 5.0;
        }
        let entry = smurf_scores.entry(&event.account_id).or_insert(0.0);
        *entry = entry.max(score);
    }

    // Shells: 25 per member; interiors of deeper chains carry extra risk.
    let mut shell_scores: HashMap<&str, f64> = HashMap::new();
    for shell in shells {
        for node in &shell.chain {
            let entry = shell_scores.entry(node).or_insert(0.0);
            *entry = entry.max(25.0);
        }
        for node in &shell.intermediate_accounts {
            let entry = shell_scores.entry(node).or_insert(0.0);
            *entry = entry.max(25.0 + 10.0 * shell.shell_depth as f64);
        }
    }

    let mut scores = HashMap::with_capacity(profiles.len());
    for (account_id, profile) in profiles {
        let mut score = 0.0;

        if let Some(s) = cycle_scores.get(account_id.as_str()) {
            score += s;
        }
        if let Some(s) = smurf_scores.get(account_id.as_str()) {
            score += s;
        }
        if let Some(s) = shell_scores.get(account_id.as_str()) {
            score += s;
        }

        // Hub bonus: logarithmic in activity, capped at +15.
        if profile.transaction_count > 10 {
            let centrality = (profile.transaction_count as f64).log10() * 5.0;
            score += centrality.min(15.0);
        }

        // Volume anomaly: unusually large average transfer size.
        if profile.transaction_count > 0 {
            let avg = (profile.total_inflow + profile.total_outflow)
                / (2.0 * profile.transaction_count as f64);
            if avg > 50_000.0 {
                score += 10.0;
            }
        }

        if profile.is_payroll {
            score -= 50.0;
        }
        if profile.is_merchant {
            score -= 40.0;
        }
        if profile.is_salary {
            score -= 30.0;
        }
        if profile.is_established_business {
            score -= 40.0;
        }

        scores.insert(account_id.clone(), round1(score.clamp(0.0, 100.0)));
    }

    scores
}

/// Per-account maps derived from the unified detector results:
/// ring membership, raw pattern families, and report labels.
pub struct PatternMaps {
    /// account → ring ids, in detector emission order.
    pub ring_map: HashMap<String, Vec<String>>,
    /// account → raw pattern families, in detector emission order.
    pub raw_patterns: HashMap<String, Vec<PatternType>>,
    /// account → sorted label set (`cycle_length_3`, `high_velocity`, ...).
    pub labels: HashMap<String, BTreeSet<String>>,
}

/// Build the per-account ring and pattern maps.
#[must_use]
pub fn build_pattern_maps(
    cycles: &[CycleResult],
    smurfing: &[SmurfingResult],
    shells: &[ShellResult],
) -> PatternMaps {
    let mut ring_map: HashMap<String, Vec<String>> = HashMap::new();
    let mut raw_patterns: HashMap<String, Vec<PatternType>> = HashMap::new();
    let mut labels: HashMap<String, BTreeSet<String>> = HashMap::new();

    for cycle in cycles {
        let label = format!("cycle_length_{}", cycle.length);
        for node in &cycle.nodes {
            ring_map
                .entry(node.clone())
                .or_default()
                .push(cycle.ring_id.clone());
            raw_patterns
                .entry(node.clone())
                .or_default()
                .push(PatternType::Cycle);
            labels.entry(node.clone()).or_default().insert(label.clone());
        }
    }

    for event in smurfing {
        ring_map
            .entry(event.account_id.clone())
            .or_default()
            .push(event.ring_id.clone());
        raw_patterns
            .entry(event.account_id.clone())
            .or_default()
            .push(event.direction.into());
        let entry = labels.entry(event.account_id.clone()).or_default();
        entry.insert(event.direction.as_str().to_string());
        if event.velocity_per_hour > HIGH_VELOCITY_PER_HOUR {
            entry.insert("high_velocity".to_string());
        }
    }

    for shell in shells {
        for node in &shell.chain {
            ring_map
                .entry(node.clone())
                .or_default()
                .push(shell.ring_id.clone());
            raw_patterns
                .entry(node.clone())
                .or_default()
                .push(PatternType::Shell);
            labels
                .entry(node.clone())
                .or_default()
                .insert("shell".to_string());
        }
    }

    PatternMaps {
        ring_map,
        raw_patterns,
        labels,
    }
}

/// Assemble suspicious accounts: every account with a positive score,
/// sorted by score descending with account-id tiebreak.
#[must_use]
pub fn build_suspicious_accounts(
    scores: &HashMap<String, f64>,
    profiles: &HashMap<String, AccountProfile>,
    maps: &PatternMaps,
    graph: &TransactionGraph,
) -> Vec<SuspiciousAccount> {
    let mut accounts: Vec<SuspiciousAccount> = Vec::new();

    for (account_id, &score) in scores {
        if score <= 0.0 {
            continue;
        }

        let mut ring_ids = maps.ring_map.get(account_id).cloned().unwrap_or_default();
        ring_ids.sort();
        ring_ids.dedup();

        let connected: Vec<String> = graph
            .successors(account_id)
            .union(graph.predecessors(account_id))
            .filter(|id| *id != account_id)
            .cloned()
            .collect();

        let profile = profiles.get(account_id);

        accounts.push(SuspiciousAccount {
            account_id: account_id.clone(),
            suspicion_score: score,
            detected_patterns: maps
                .labels
                .get(account_id)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default(),
            ring_id: ring_ids.first().cloned().unwrap_or_default(),
            account_type: profile.map_or(crate::types::AccountType::Individual, |p| {
                p.account_type
            }),
            total_inflow: profile.map_or(0.0, |p| p.total_inflow),
            total_outflow: profile.map_or(0.0, |p| p.total_outflow),
            transaction_count: profile.map_or(0, |p| p.transaction_count),
            connected_accounts: connected,
            ring_ids,
        });
    }

    accounts.sort_by(|a, b| {
        b.suspicion_score
            .total_cmp(&a.suspicion_score)
            .then_with(|| a.account_id.cmp(&b.account_id))
    });
    accounts
}

/// Assemble fraud rings: one record per unified ring id, risk = max
/// member score, sorted by risk descending.
#[must_use]
pub fn build_fraud_rings(
    scores: &HashMap<String, f64>,
    cycles: &[CycleResult],
    smurfing: &[SmurfingResult],
    shells: &[ShellResult],
) -> Vec<FraudRing> {
    let max_score = |members: &[String]| -> f64 {
        members
            .iter()
            .filter_map(|m| scores.get(m))
            .fold(0.0, |acc: f64, &s| acc.max(s))
    };

    let sorted_members = |nodes: &[String]| -> Vec<String> {
        let set: BTreeSet<&String> = nodes.iter().collect();
        set.into_iter().cloned().collect()
    };

    // Assembled in unified ring-id order; the stable sort below keeps
    // that order within equal risk scores.
    let mut rings: Vec<FraudRing> = Vec::new();

    for cycle in cycles {
        let members = sorted_members(&cycle.nodes);
        rings.push(FraudRing {
            ring_id: cycle.ring_id.clone(),
            risk_score: max_score(&members),
            member_accounts: members,
            pattern_type: PatternType::Cycle,
        });
    }

    for event in smurfing {
        let members = vec![event.account_id.clone()];
        rings.push(FraudRing {
            ring_id: event.ring_id.clone(),
            risk_score: max_score(&members),
            member_accounts: members,
            pattern_type: event.direction.into(),
        });
    }

    for shell in shells {
        let members = sorted_members(&shell.chain);
        rings.push(FraudRing {
            ring_id: shell.ring_id.clone(),
            risk_score: max_score(&members),
            member_accounts: members,
            pattern_type: PatternType::Shell,
        });
    }

    rings.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    rings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountType, FanDirection};
    use chrono::{DateTime, TimeZone, Utc};

    fn profile(account_id: &str, inflow: f64, outflow: f64, count: usize) -> AccountProfile {
        AccountProfile {
            account_id: account_id.to_string(),
            is_payroll: false,
            is_merchant: false,
            is_salary: false,
            is_established_business: false,
            account_type: AccountType::Individual,
            total_inflow: inflow,
            total_outflow: outflow,
            transaction_count: count,
            first_seen: ts(),
            last_seen: ts(),
        }
    }

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn cycle(nodes: &[&str], total: f64) -> CycleResult {
        CycleResult {
            ring_id: String::new(),
            nodes: nodes.iter().map(|s| s.to_string()).collect(),
            length: nodes.len(),
            total_amount: total,
            time_span_hours: 8.0,
            edge_count: nodes.len(),
        }
    }

    fn smurf(account: &str, unique: usize, total: f64, velocity: f64) -> SmurfingResult {
        SmurfingResult {
            ring_id: String::new(),
            account_id: account.to_string(),
            direction: FanDirection::FanIn,
            unique_counterparties: unique,
            total_amount: total,
            velocity_per_hour: velocity,
            window_start: ts(),
            window_end: ts(),
        }
    }

    fn shell(chain: &[&str]) -> ShellResult {
        let chain: Vec<String> = chain.iter().map(|s| s.to_string()).collect();
        let interiors = chain[1..chain.len() - 1].to_vec();
        ShellResult {
            ring_id: String::new(),
            shell_depth: interiors.len(),
            intermediate_accounts: interiors,
            total_amount: 1_000.0,
            chain,
        }
    }

    #[test]
    fn test_ring_ids_unified_in_order() {
        let mut cycles = vec![cycle(&["A", "B", "C"], 100.0), cycle(&["D", "E", "F"], 100.0)];
        let mut smurfing = vec![
            smurf("M1", 12, 1_000.0, 10.0),
            smurf("M2", 11, 1_000.0, 10.0),
            smurf("M3", 10, 1_000.0, 10.0),
        ];
        let mut shells = vec![shell(&["S", "x", "y", "z", "T"])];

        assign_ring_ids(&mut cycles, &mut smurfing, &mut shells);

        assert_eq!(cycles[0].ring_id, "RING_001");
        assert_eq!(cycles[1].ring_id, "RING_002");
        assert_eq!(smurfing[0].ring_id, "RING_003");
        assert_eq!(smurfing[2].ring_id, "RING_005");
        assert_eq!(shells[0].ring_id, "RING_006");
    }

    #[test]
    fn test_cycle_scoring_by_length() {
        let profiles: HashMap<String, AccountProfile> = ["A", "B", "C"]
            .iter()
            .map(|id| (id.to_string(), profile(id, 5_000.0, 5_000.0, 2)))
            .collect();

        let cycles = vec![cycle(&["A", "B", "C"], 14_850.0)];
        let scores = calculate_scores(&profiles, &cycles, &[], &[]);

        // 20 * (6 - 3) = 60, +10 for the high-value bonus.
        assert_eq!(scores["A"], 70.0);
        assert_eq!(scores["B"], 70.0);
        assert_eq!(scores["C"], 70.0);
    }

    #[test]
    fn test_strongest_cycle_wins_not_sum() {
        let profiles: HashMap<String, AccountProfile> = [
            ("A".to_string(), profile("A", 100.0, 100.0, 4)),
            ("B".to_string(), profile("B", 100.0, 100.0, 4)),
            ("C".to_string(), profile("C", 100.0, 100.0, 4)),
            ("D".to_string(), profile("D", 100.0, 100.0, 4)),
        ]
        .into_iter()
        .collect();

        // A sits in both a 3-cycle and a 4-cycle; only the 3-cycle counts.
        let cycles = vec![cycle(&["A", "B", "C"], 100.0), cycle(&["A", "C", "D", "B"], 100.0)];
        let scores = calculate_scores(&profiles, &cycles, &[], &[]);
        assert_eq!(scores["A"], 60.0);
        assert_eq!(scores["D"], 40.0);
    }

    #[test]
    fn test_smurfing_bonuses() {
        let profiles: HashMap<String, AccountProfile> =
            [("M".to_string(), profile("M", 150_000.0, 0.0, 5))]
                .into_iter()
                .collect();

        let smurfing = vec![smurf("M", 25, 150_000.0, 6_000.0)];
        let scores = calculate_scores(&profiles, &[], &smurfing, &[]);

        // 25 base + 10 velocity + 5 counterparties + 5 volume.
        assert_eq!(scores["M"], 45.0);
    }

    #[test]
    fn test_shell_depth_bonus() {
        let profiles: HashMap<String, AccountProfile> = ["S", "x", "y", "z", "T"]
            .iter()
            .map(|id| (id.to_string(), profile(id, 1_000.0, 1_000.0, 2)))
            .collect();

        let shells = vec![shell(&["S", "x", "y", "z", "T"])];
        let scores = calculate_scores(&profiles, &[], &[], &shells);

        assert_eq!(scores["S"], 25.0, "terminal nodes take the base only");
        assert_eq!(scores["T"], 25.0);
        assert_eq!(scores["x"], 55.0, "interior: 25 + 10 * depth 3");
    }

    #[test]
    fn test_centrality_and_volume_bonuses() {
        let profiles: HashMap<String, AccountProfile> = [
            ("hub".to_string(), profile("hub", 6_000_000.0, 6_000_000.0, 100)),
        ]
        .into_iter()
        .collect();

        let shells = vec![shell(&["hub", "a", "b", "sink"])];
        let scores = calculate_scores(&profiles, &[], &[], &shells);

        // 25 shell + 10 centrality (log10(100) * 5) + 10 volume anomaly.
        assert_eq!(scores["hub"], 45.0);
    }

    #[test]
    fn test_payroll_suppression() {
        let mut payroll = profile("E", 200_000.0, 0.0, 4);
        payroll.is_payroll = true;
        let profiles: HashMap<String, AccountProfile> =
            [("E".to_string(), payroll)].into_iter().collect();

        let cycles = vec![cycle(&["E", "F", "G"], 100.0)];
        let scores = calculate_scores(&profiles, &cycles, &[], &[]);
        assert_eq!(scores["E"], 10.0, "60 cycle - 50 payroll");
    }

    #[test]
    fn test_score_clamped_to_zero() {
        let mut quiet = profile("Q", 1_000.0, 0.0, 3);
        quiet.is_payroll = true;
        quiet.is_merchant = true;
        let profiles: HashMap<String, AccountProfile> =
            [("Q".to_string(), quiet)].into_iter().collect();

        let scores = calculate_scores(&profiles, &[], &[], &[]);
        assert_eq!(scores["Q"], 0.0);
    }

    #[test]
    fn test_pattern_labels() {
        let mut cycles = vec![cycle(&["A", "B", "C"], 100.0)];
        let mut smurfing = vec![smurf("M", 12, 1_000.0, 6_000.0)];
        let mut shells = vec![shell(&["A", "x", "y", "T"])];
        assign_ring_ids(&mut cycles, &mut smurfing, &mut shells);

        let maps = build_pattern_maps(&cycles, &smurfing, &shells);

        let a_labels: Vec<&String> = maps.labels["A"].iter().collect();
        assert_eq!(a_labels, ["cycle_length_3", "shell"]);

        let m_labels: Vec<&String> = maps.labels["M"].iter().collect();
        assert_eq!(m_labels, ["fan_in", "high_velocity"]);

        assert_eq!(maps.ring_map["A"], ["RING_001", "RING_003"]);
        assert_eq!(maps.raw_patterns["A"], [PatternType::Cycle, PatternType::Shell]);
    }

    #[test]
    fn test_fraud_ring_assembly() {
        let mut cycles = vec![cycle(&["B", "A", "C"], 100.0)];
        let mut smurfing = vec![smurf("M", 12, 1_000.0, 10.0)];
        let mut shells: Vec<ShellResult> = Vec::new();
        assign_ring_ids(&mut cycles, &mut smurfing, &mut shells);

        let scores: HashMap<String, f64> = [
            ("A".to_string(), 70.0),
            ("B".to_string(), 70.0),
            ("C".to_string(), 70.0),
            ("M".to_string(), 25.0),
        ]
        .into_iter()
        .collect();

        let rings = build_fraud_rings(&scores, &cycles, &smurfing, &shells);
        assert_eq!(rings.len(), 2);

        // Sorted by risk descending.
        assert_eq!(rings[0].ring_id, "RING_001");
        assert_eq!(rings[0].pattern_type, PatternType::Cycle);
        assert_eq!(rings[0].member_accounts, ["A", "B", "C"]);
        assert_eq!(rings[0].risk_score, 70.0);

        assert_eq!(rings[1].ring_id, "RING_002");
        assert_eq!(rings[1].pattern_type, PatternType::FanIn);
        assert_eq!(rings[1].member_accounts, ["M"]);
    }

    #[test]
    fn test_suspicious_accounts_sorted_with_tiebreak() {
        let graph = TransactionGraph::build(&[]);
        let profiles: HashMap<String, AccountProfile> = ["zed", "abe", "mid"]
            .iter()
            .map(|id| (id.to_string(), profile(id, 0.0, 0.0, 1)))
            .collect();

        let scores: HashMap<String, f64> = [
            ("zed".to_string(), 50.0),
            ("abe".to_string(), 50.0),
            ("mid".to_string(), 80.0),
        ]
        .into_iter()
        .collect();

        let maps = build_pattern_maps(&[], &[], &[]);
        let accounts = build_suspicious_accounts(&scores, &profiles, &maps, &graph);

        let ids: Vec<&str> = accounts.iter().map(|a| a.account_id.as_str()).collect();
        assert_eq!(ids, ["mid", "abe", "zed"]);
    }

    #[test]
    fn test_zero_scores_not_emitted() {
        let graph = TransactionGraph::build(&[]);
        let profiles: HashMap<String, AccountProfile> =
            [("quiet".to_string(), profile("quiet", 0.0, 0.0, 1))]
                .into_iter()
                .collect();
        let scores: HashMap<String, f64> =
            [("quiet".to_string(), 0.0)].into_iter().collect();

        let maps = build_pattern_maps(&[], &[], &[]);
        let accounts = build_suspicious_accounts(&scores, &profiles, &maps, &graph);
        assert!(accounts.is_empty());
    }
}
