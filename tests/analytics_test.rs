//! End-to-end behaviour of the analyzers through the public API

use chainsight::config::{AnalyticsConfig, MigrationConfig};
use chainsight::services::{
    AlignmentAnalyzer, LevelDetector, MagnetGapDetector, SkewAnalyzer, TimePressureAnalyzer,
};
use chainsight::types::*;
use chainsight::{ChainEngine, MigrationTracker, TrackerRegistry};
use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use std::thread;

fn quote(strike: f64, ce_oi: u64, pe_oi: u64) -> StrikeQuote {
    StrikeQuote::with_legs(strike, ce_oi, 0.15, pe_oi, 0.15)
}

/// 50-point ladder from `first` with flat 60k/40k OI, then overrides.
fn ladder(spot: f64, first: f64, count: usize, overrides: &[(f64, StrikeQuote)]) -> ChainSnapshot {
    let quotes = (0..count)
        .map(|i| {
            let strike = first + i as f64 * 50.0;
            overrides
                .iter()
                .find(|(s, _)| *s == strike)
                .map(|(_, q)| q.clone())
                .unwrap_or_else(|| quote(strike, 60_000, 40_000))
        })
        .collect();
    ChainSnapshot::new(spot, quotes).unwrap()
}

#[test]
fn test_put_heavy_strike_is_support() {
    let snap = ladder(
        20_000.0,
        19_800.0,
        9,
        &[(20_000.0, quote(20_000.0, 50_000, 200_000))],
    );

    let supports = LevelDetector::default().find_supports(&snap);
    assert_eq!(supports.len(), 1);
    assert_eq!(supports[0].strike, 20_000.0);
    assert!((supports[0].strength - 0.79998).abs() < 1e-4);
}

#[test]
fn test_window_outlier_is_magnet() {
    let snap = ladder(
        20_000.0,
        19_500.0,
        21,
        &[(20_000.0, quote(20_000.0, 1_500_000, 1_200_000))],
    );

    let map = MagnetGapDetector::default().detect(&snap);
    assert_eq!(map.magnets.len(), 1);
    assert_eq!(map.magnets[0].strike, 20_000.0);
    assert!(map.magnets[0].z_score > 0.0);
    assert_eq!(map.nearest_magnet.as_ref().map(|m| m.strike), Some(20_000.0));
    assert!(!map.spot_in_gap);
}

#[test]
fn test_converging_writers_are_bullish() {
    let tracker = MigrationTracker::default();
    let mut last = None;

    for i in 0..5 {
        let step = i as f64 * 50.0;
        let ce_max = 20_400.0 - step;
        let pe_max = 19_600.0 + step;
        let snap = ladder(
            20_000.0,
            19_000.0,
            41,
            &[
                (ce_max, quote(ce_max, 3_000_000, 100_000)),
                (pe_max, quote(pe_max, 100_000, 3_000_000)),
            ],
        );
        last = Some(tracker.analyze(&snap));
    }

    let analysis: MigrationAnalysis = last.unwrap();
    assert_eq!(analysis.migration_trend.overall, MigrationRegime::Bullish);
    assert!(analysis.trend_strength > 0.0);
    assert_eq!(analysis.history_len, 5);
    assert_eq!(analysis.current_max_oi.max_ce.strike, Some(20_200.0));
    assert_eq!(analysis.current_max_oi.max_pe.strike, Some(19_800.0));
}

#[test]
fn test_rich_puts_at_atm_are_pe_fear() {
    let snap = ChainSnapshot::new(
        20_000.0,
        vec![
            StrikeQuote::with_legs(19_950.0, 100_000, 0.15, 100_000, 0.16),
            StrikeQuote::with_legs(20_000.0, 100_000, 0.10, 100_000, 0.30),
            StrikeQuote::with_legs(20_050.0, 100_000, 0.15, 100_000, 0.16),
        ],
    )
    .unwrap();

    let skews = SkewAnalyzer::default().one_sided_skew(&snap);
    let atm = skews.iter().find(|s| s.strike == 20_000.0).unwrap();
    assert!((atm.skew_ratio - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(atm.skew_type, SkewType::PeFear);
}

#[test]
fn test_mid_morning_starts_at_half_past_ten() {
    let analyzer = TimePressureAnalyzer::default();
    let snap = ladder(20_000.0, 19_800.0, 9, &[]);

    let at = NaiveTime::from_hms_opt(10, 30, 0).unwrap();
    assert_eq!(analyzer.analyze_at(&snap, at).time_phase, TimePhase::MidMorning);
    let before = NaiveTime::from_hms_opt(10, 29, 59).unwrap();
    assert_eq!(
        analyzer.analyze_at(&snap, before).time_phase,
        TimePhase::OpeningPhase
    );
}

#[test]
fn test_scores_stay_in_unit_range() {
    let snap = ladder(
        20_020.0,
        19_500.0,
        21,
        &[
            (19_800.0, quote(19_800.0, 20_000, 900_000)),
            (20_050.0, quote(20_050.0, 2_000_000, 1_500_000)),
            (20_300.0, quote(20_300.0, 1_100_000, 30_000)),
        ],
    );
    let detector = LevelDetector::default();
    let levels = detector
        .find_supports(&snap)
        .into_iter()
        .chain(detector.find_resistances(&snap));
    for level in levels {
        assert!((0.0..=1.0).contains(&level.strength));
    }

    let analyzer = TimePressureAnalyzer::default();
    for hour in 8..17 {
        let t = analyzer.analyze_at(&snap, NaiveTime::from_hms_opt(hour, 10, 0).unwrap());
        assert!((0.0..=1.0).contains(&t.time_into_session));
        assert!((0.0..=1.0).contains(&t.pinning_pressure.pressure));
        assert!(t.pinning_pressure.target_strikes.len() <= 3);
    }
}

#[test]
fn test_pure_analyzers_are_idempotent() {
    let near = ladder(
        20_000.0,
        19_500.0,
        21,
        &[
            (19_800.0, quote(19_800.0, 20_000, 900_000)),
            (20_000.0, quote(20_000.0, 2_500_000, 2_000_000)),
        ],
    );
    let far = ladder(20_000.0, 19_500.0, 21, &[(19_800.0, quote(19_800.0, 10_000, 700_000))]);

    let magnets = MagnetGapDetector::default();
    assert_eq!(magnets.detect(&near), magnets.detect(&near));

    let skew = SkewAnalyzer::default();
    assert_eq!(skew.analyze(&near, &[20_000.0]), skew.analyze(&near, &[20_000.0]));

    let alignment = AlignmentAnalyzer::default();
    let first = alignment.analyze(&near, &far);
    assert_eq!(first, alignment.analyze(&near, &far));
    assert_eq!(first.support_alignment.alignment_count, 1);
    assert_eq!(
        first.gamma_vs_swing.trading_implication,
        TradingImplication::TrustLevels
    );
}

#[test]
fn test_tracker_history_never_exceeds_period() {
    let tracker = MigrationTracker::new(MigrationConfig {
        track_period: 4,
        ..Default::default()
    });
    let snap = ladder(20_000.0, 19_800.0, 9, &[]);
    for _ in 0..10 {
        let analysis = tracker.analyze(&snap);
        assert!(analysis.history_len <= 4);
    }
    assert_eq!(tracker.len(), 4);
}

#[test]
fn test_concurrent_updates_share_one_history() {
    let registry = TrackerRegistry::new(MigrationConfig::default());
    let snap = Arc::new(ladder(20_000.0, 19_800.0, 9, &[]));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let snap = Arc::clone(&snap);
            thread::spawn(move || {
                for _ in 0..5 {
                    registry.tracker("NIFTY").analyze(&snap);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.tracker("NIFTY").len(), 20);
    assert!(registry.tracker("BANKNIFTY").is_empty());
}

#[test]
fn test_engine_report_from_wire_input() {
    let json = r#"{
        "spotPrice": 20000,
        "chain": {
            "19900": {"CE": {"open_interest": 80000, "IV": 0.16}, "PE": {"open_interest": 450000, "IV": 0.18}},
            "20000": {"CE": {"open_interest": 400000, "IV": 0.14}, "PE": {"open_interest": 380000, "IV": 0.15}},
            "20100": {"CE": {"open_interest": 520000, "IV": 0.13}, "PE": {"open_interest": 90000, "IV": 0.17}}
        }
    }"#;
    let snap: ChainSnapshot = serde_json::from_str(json).unwrap();
    let at = NaiveDate::from_ymd_opt(2024, 1, 25)
        .unwrap()
        .and_hms_opt(14, 45, 0)
        .unwrap();

    let engine = ChainEngine::new(&AnalyticsConfig::default());
    let report = engine.analyze(&snap, None, at, None);

    assert_eq!(report.supports[0].strike, 19_900.0);
    assert_eq!(report.resistances[0].strike, 20_100.0);
    // Too few strikes for a full window
    assert!(report.magnet_map.magnets.is_empty());
    assert_eq!(report.skew.atm_strike, Some(20_000.0));
    assert_eq!(report.time_pressure.time_phase, TimePhase::GammaGamePhase);
    assert_eq!(report.time_pressure.gamma_risk, 0.8);
}
