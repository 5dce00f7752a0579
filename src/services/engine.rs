//! One-call composition of every analyzer.

use crate::config::AnalyticsConfig;
use crate::services::alignment::AlignmentAnalyzer;
use crate::services::levels::LevelDetector;
use crate::services::magnets::MagnetGapDetector;
use crate::services::migration::MigrationTracker;
use crate::services::skew::SkewAnalyzer;
use crate::services::time_pressure::TimePressureAnalyzer;
use crate::types::{ChainReport, ChainSnapshot};
use chrono::NaiveDateTime;
use tracing::{info, warn};

/// Stateless analyzers wired from one [`AnalyticsConfig`]. Migration state
/// lives in a [`MigrationTracker`] the caller owns.
#[derive(Debug, Clone)]
pub struct ChainEngine {
    levels: LevelDetector,
    magnets: MagnetGapDetector,
    skew: SkewAnalyzer,
    alignment: AlignmentAnalyzer,
    time_pressure: TimePressureAnalyzer,
}

impl ChainEngine {
    pub fn new(config: &AnalyticsConfig) -> Self {
        let levels = LevelDetector::new(config.levels.clone());
        Self {
            alignment: AlignmentAnalyzer::new(levels.clone(), config.alignment.clone()),
            levels,
            magnets: MagnetGapDetector::new(config.magnets.clone()),
            skew: SkewAnalyzer::new(config.skew.clone()),
            time_pressure: TimePressureAnalyzer::new(config.session.clone()),
        }
    }

    pub fn levels(&self) -> &LevelDetector {
        &self.levels
    }

    pub fn magnets(&self) -> &MagnetGapDetector {
        &self.magnets
    }

    pub fn skew(&self) -> &SkewAnalyzer {
        &self.skew
    }

    pub fn alignment(&self) -> &AlignmentAnalyzer {
        &self.alignment
    }

    pub fn time_pressure(&self) -> &TimePressureAnalyzer {
        &self.time_pressure
    }

    /// Run every analyzer over `near`. Alignment needs a `far` expiry and
    /// migration needs a tracker; either is skipped when absent.
    pub fn analyze(
        &self,
        near: &ChainSnapshot,
        far: Option<&ChainSnapshot>,
        at: NaiveDateTime,
        tracker: Option<&MigrationTracker>,
    ) -> ChainReport {
        if near.is_empty() {
            warn!("Analysing an empty chain; all results will be neutral");
        }

        let magnet_map = self.magnets.detect(near);
        let magnet_strikes: Vec<f64> = magnet_map.magnets.iter().map(|m| m.strike).collect();

        let report = ChainReport {
            analysed_at: at,
            spot_price: near.spot_price(),
            supports: self.levels.find_supports(near),
            resistances: self.levels.find_resistances(near),
            skew: self.skew.analyze(near, &magnet_strikes),
            magnet_map,
            alignment: far.map(|far| self.alignment.analyze(near, far)),
            migration: tracker.map(|t| t.analyze(near)),
            time_pressure: self.time_pressure.analyze(near, at),
        };

        info!(
            "Analysed chain at spot {}: {} supports, {} resistances, {} magnets, phase {}",
            report.spot_price,
            report.supports.len(),
            report.resistances.len(),
            report.magnet_map.magnets.len(),
            report.time_pressure.time_phase
        );
        report
    }
}

impl Default for ChainEngine {
    fn default() -> Self {
        Self::new(&AnalyticsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StrikeQuote, TimePhase};
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 25)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn chain() -> ChainSnapshot {
        let quotes = (0..15)
            .map(|i| {
                let strike = 19_650.0 + i as f64 * 50.0;
                let (ce, pe) = match i {
                    7 => (2_000_000, 2_500_000),
                    3 => (100_000, 600_000),
                    11 => (700_000, 100_000),
                    _ => (100_000, 100_000),
                };
                StrikeQuote::with_legs(strike, ce, 0.15, pe, 0.17)
            })
            .collect();
        ChainSnapshot::new(20_010.0, quotes).unwrap()
    }

    #[test]
    fn test_engine_runs_every_analyzer() {
        let engine = ChainEngine::default();
        let tracker = MigrationTracker::default();
        let snap = chain();

        let report = engine.analyze(&snap, Some(&snap), at(12, 0), Some(&tracker));

        assert_eq!(report.spot_price, 20_010.0);
        assert_eq!(report.supports[0].strike, 19_800.0);
        assert_eq!(report.resistances[0].strike, 20_200.0);
        assert_eq!(report.magnet_map.magnets[0].strike, 20_000.0);
        assert_eq!(report.skew.atm_strike, Some(20_000.0));
        assert_eq!(report.skew.magnet_skew.len(), 1);
        assert!(report.alignment.is_some());
        assert_eq!(report.migration.unwrap().history_len, 1);
        assert_eq!(report.time_pressure.time_phase, TimePhase::SellerComfortWindow);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_optional_parts_skipped() {
        let report = ChainEngine::default().analyze(&chain(), None, at(9, 30), None);
        assert!(report.alignment.is_none());
        assert!(report.migration.is_none());
        assert_eq!(report.time_pressure.time_phase, TimePhase::OpeningPhase);
    }

    #[test]
    fn test_report_serialises_camel_case() {
        let report = ChainEngine::default().analyze(&chain(), None, at(15, 0), None);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("magnetMap").is_some());
        assert_eq!(json["timePressure"]["timePhase"], "GAMMA_GAME_PHASE");
    }
}
