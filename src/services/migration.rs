//! Intraday migration of the dominant call/put OI strikes.
//!
//! A [`MigrationTracker`] owns a bounded FIFO history of [`MigrationRecord`]s
//! for one symbol. Each call extracts the current max-OI strikes, appends
//! them, and fits a least-squares trend over the whole history while holding
//! the tracker's lock, so concurrent callers always fit a consistent view.

use crate::config::MigrationConfig;
use crate::services::stats::ols_slope;
use crate::types::{
    ChainSnapshot, Direction, ExhaustionSignal, LegTrend, MaxOiStrike, MigrationAnalysis,
    MigrationRecord, MigrationRegime, MigrationTrend, NextLevels, ProjectedLevel,
};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Bounded, oldest-first record history.
#[derive(Debug, Clone)]
pub struct MigrationHistory {
    records: VecDeque<MigrationRecord>,
    capacity: usize,
}

impl MigrationHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record, evicting the oldest once over capacity.
    pub fn push(&mut self, record: MigrationRecord) {
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn records(&self) -> impl Iterator<Item = &MigrationRecord> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&MigrationRecord> {
        self.records.back()
    }

    /// Fit the call and put trends over the current history.
    pub fn trend(&self, config: &MigrationConfig) -> MigrationTrend {
        if self.records.len() < config.min_records {
            return MigrationTrend::neutral();
        }

        let ce_strikes: Vec<f64> = self.records.iter().filter_map(|r| r.max_ce.strike).collect();
        let pe_strikes: Vec<f64> = self.records.iter().filter_map(|r| r.max_pe.strike).collect();

        let ce_slope = fit_leg(&ce_strikes, config);
        let pe_slope = fit_leg(&pe_strikes, config);
        let ce_trend = classify_slope(ce_slope, config);
        let pe_trend = classify_slope(pe_slope, config);

        let overall = match (ce_trend, pe_trend) {
            // Call writers retreating down while put writers chase up
            (LegTrend::Down, LegTrend::Up) => MigrationRegime::Bullish,
            (LegTrend::Up, LegTrend::Down) => MigrationRegime::Bearish,
            (LegTrend::Up, LegTrend::Up) => MigrationRegime::Consolidation,
            _ => MigrationRegime::Neutral,
        };

        let divergence = match (ce_slope, pe_slope) {
            (Some(ce), Some(pe)) => (ce - pe).abs(),
            _ => 0.0,
        };
        let ce_slope = ce_slope.unwrap_or(0.0);
        let pe_slope = pe_slope.unwrap_or(0.0);

        MigrationTrend {
            ce_trend,
            pe_trend,
            overall,
            ce_slope,
            pe_slope,
            divergence,
            velocity: (ce_slope.abs() + pe_slope.abs()) / 2.0,
        }
    }
}

fn fit_leg(strikes: &[f64], config: &MigrationConfig) -> Option<f64> {
    if strikes.len() < config.min_records {
        None
    } else {
        Some(ols_slope(strikes))
    }
}

fn classify_slope(slope: Option<f64>, config: &MigrationConfig) -> LegTrend {
    match slope {
        None => LegTrend::Neutral,
        Some(s) if s > config.slope_threshold => LegTrend::Up,
        Some(s) if s < -config.slope_threshold => LegTrend::Down,
        Some(_) => LegTrend::Flat,
    }
}

/// Max-OI call and put strikes of a snapshot. The first strike seen wins a
/// tie; a leg with no positive OI anywhere has no strike.
pub fn max_oi_record(snapshot: &ChainSnapshot) -> MigrationRecord {
    let mut max_ce = MaxOiStrike::default();
    let mut max_pe = MaxOiStrike::default();

    for quote in snapshot.strikes() {
        if quote.ce_oi() > max_ce.oi {
            max_ce = MaxOiStrike {
                strike: Some(quote.strike),
                oi: quote.ce_oi(),
            };
        }
        if quote.pe_oi() > max_pe.oi {
            max_pe = MaxOiStrike {
                strike: Some(quote.strike),
                oi: quote.pe_oi(),
            };
        }
    }

    let distance = match (max_ce.strike, max_pe.strike) {
        (Some(ce), Some(pe)) => (ce - pe).abs(),
        _ => 0.0,
    };

    MigrationRecord {
        max_ce,
        max_pe,
        distance,
    }
}

/// Stateful migration tracker for one symbol.
#[derive(Debug)]
pub struct MigrationTracker {
    config: MigrationConfig,
    history: Mutex<MigrationHistory>,
}

impl MigrationTracker {
    pub fn new(config: MigrationConfig) -> Self {
        let history = MigrationHistory::new(config.track_period);
        Self {
            config,
            history: Mutex::new(history),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MigrationHistory> {
        // A panic mid-update can at worst leave one extra record; keep going
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a snapshot and analyse the updated history.
    pub fn analyze(&self, snapshot: &ChainSnapshot) -> MigrationAnalysis {
        let current = max_oi_record(snapshot);

        let (trend, history_len) = {
            let mut history = self.lock();
            let evicting = history.len() == history.capacity();
            history.push(current);
            if evicting {
                debug!("Migration history full, evicted oldest record");
            }
            (history.trend(&self.config), history.len())
        };

        MigrationAnalysis {
            current_max_oi: current,
            migration_trend: trend,
            exhaustion_signals: self.exhaustion_signals(&current, &trend),
            trend_strength: trend_strength(&trend),
            next_potential_level: self.next_levels(&current, &trend),
            history_len,
        }
    }

    /// Feed an oldest-first sequence of snapshots; returns the analysis of
    /// the last one.
    pub fn replay(&self, snapshots: &[ChainSnapshot]) -> Option<MigrationAnalysis> {
        snapshots.iter().map(|s| self.analyze(s)).last()
    }

    /// Trend over the current history without recording anything.
    pub fn trend(&self) -> MigrationTrend {
        self.lock().trend(&self.config)
    }

    /// Copy of the current history, oldest first.
    pub fn history(&self) -> Vec<MigrationRecord> {
        self.lock().records().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        let mut history = self.lock();
        *history = MigrationHistory::new(self.config.track_period);
    }

    fn exhaustion_signals(
        &self,
        current: &MigrationRecord,
        trend: &MigrationTrend,
    ) -> Vec<ExhaustionSignal> {
        let mut signals = Vec::new();

        if trend.ce_trend == LegTrend::Flat && trend.pe_trend != LegTrend::Flat {
            signals.push(ExhaustionSignal::CeMigrationStall);
        }
        if trend.pe_trend == LegTrend::Flat && trend.ce_trend != LegTrend::Flat {
            signals.push(ExhaustionSignal::PeMigrationStall);
        }
        if trend.divergence > self.config.divergence_threshold {
            signals.push(ExhaustionSignal::HighDivergence);
        }
        let both_known = current.max_ce.strike.is_some() && current.max_pe.strike.is_some();
        if both_known && current.distance < self.config.pinning_distance {
            signals.push(ExhaustionSignal::TightPinning);
        }

        signals
    }

    fn next_levels(&self, current: &MigrationRecord, trend: &MigrationTrend) -> NextLevels {
        let step = self.config.strike_step;
        let ce = match (trend.ce_trend, current.max_ce.strike) {
            (LegTrend::Down, Some(strike)) => Some(ProjectedLevel {
                strike: strike - step,
                direction: Direction::Down,
                confidence: trend.ce_slope.abs(),
            }),
            _ => None,
        };
        let pe = match (trend.pe_trend, current.max_pe.strike) {
            (LegTrend::Up, Some(strike)) => Some(ProjectedLevel {
                strike: strike + step,
                direction: Direction::Up,
                confidence: trend.pe_slope.abs(),
            }),
            _ => None,
        };
        NextLevels { ce, pe }
    }
}

impl Default for MigrationTracker {
    fn default() -> Self {
        Self::new(MigrationConfig::default())
    }
}

/// Regime strength normalised to [0, 1].
pub fn trend_strength(trend: &MigrationTrend) -> f64 {
    let raw = match trend.overall {
        MigrationRegime::Bullish | MigrationRegime::Bearish => {
            trend.ce_slope.abs() + trend.pe_slope.abs()
        }
        MigrationRegime::Consolidation => trend.ce_slope.abs().min(trend.pe_slope.abs()),
        MigrationRegime::Neutral => 0.0,
    };
    (raw / 2.0).clamp(0.0, 1.0)
}

/// One tracker per symbol, shared across callers.
pub struct TrackerRegistry {
    config: MigrationConfig,
    trackers: DashMap<String, Arc<MigrationTracker>>,
}

impl TrackerRegistry {
    pub fn new(config: MigrationConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            trackers: DashMap::new(),
        })
    }

    /// Tracker for `symbol`, created on first use.
    pub fn tracker(&self, symbol: &str) -> Arc<MigrationTracker> {
        let key = symbol.to_uppercase();
        self.trackers
            .entry(key)
            .or_insert_with(|| Arc::new(MigrationTracker::new(self.config.clone())))
            .value()
            .clone()
    }

    /// Drop a symbol's tracker, e.g. at session end.
    pub fn remove(&self, symbol: &str) -> Option<Arc<MigrationTracker>> {
        self.trackers
            .remove(&symbol.to_uppercase())
            .map(|(_, tracker)| tracker)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.trackers.iter().map(|e| e.key().clone()).collect()
    }
}
