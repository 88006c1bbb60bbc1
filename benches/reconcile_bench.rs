//! Benchmarks for summary reconciliation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use threatlens_sync::logging::LogContext;
use threatlens_sync::model::{CorrelatedAttack, CountTable, Decision, Severity, ThreatSummary};
use threatlens_sync::reconcile::{top_tactics, ReconciliationEngine};
use threatlens_sync::SyncConfig;

const SEVERITIES: [Severity; 4] = [
    Severity::Critical,
    Severity::High,
    Severity::Medium,
    Severity::Low,
];

fn large_summary() -> ThreatSummary {
    let tactics: Vec<String> = (0..200).map(|i| format!("T{:04}", i)).collect();
    ThreatSummary {
        total_threats: 5_000,
        active: 4_200,
        critical: 900,
        by_tactic: tactics
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), (i as u64 * 37) % 101))
            .collect::<CountTable>(),
        decisions: (0..500)
            .map(|i| Decision {
                decision: format!("BLOCK_IP_{}", i),
                severity: SEVERITIES[i % 4],
                reason: "repeated authentication failures".to_string(),
                ..Decision::default()
            })
            .collect(),
        correlated_attacks: (0..300)
            .map(|i| CorrelatedAttack {
                attack: format!("ATTACK_{}", i % 12),
                severity: SEVERITIES[i % 4],
                source: format!("10.0.{}.{}", i / 250, i % 250),
                description: String::new(),
            })
            .collect(),
        raw_count: 120_000,
        ..ThreatSummary::default()
    }
}

fn bench_apply_full_summary(c: &mut Criterion) {
    let ctx = LogContext::new("bench-session");
    let config = SyncConfig::default();
    let summary = large_summary();

    c.bench_function("apply_full_summary_500_decisions", |b| {
        b.iter(|| {
            let mut engine = ReconciliationEngine::new(&ctx, &config);
            black_box(engine.apply_full_summary(summary.clone()))
        });
    });
}

fn bench_top_tactics(c: &mut Criterion) {
    let summary = large_summary();

    c.bench_function("top_tactics_200_of_5", |b| {
        b.iter(|| black_box(top_tactics(&summary.by_tactic, 5)));
    });
}

criterion_group!(benches, bench_apply_full_summary, bench_top_tactics);
criterion_main!(benches);
