//! MITRE ATT&CK tactic ranking.

use crate::model::CountTable;

/// Top `n` tactics by count, descending. Equal counts keep the server's
/// iteration order.
pub fn top_tactics(tactics: &CountTable, n: usize) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = tactics.entries().to_vec();
    // `sort_by` is stable.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);
    ranked
}
