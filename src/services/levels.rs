//! Support, resistance and threshold magnets from call/put OI imbalance.

use crate::config::LevelConfig;
use crate::types::{ChainSnapshot, Level, OiMagnet, StrikeQuote};
use tracing::debug;

/// Finds OI-dominated strikes within a single snapshot.
#[derive(Debug, Clone, Default)]
pub struct LevelDetector {
    config: LevelConfig,
}

impl LevelDetector {
    pub fn new(config: LevelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Put-heavy strikes, strongest first.
    pub fn find_supports(&self, snapshot: &ChainSnapshot) -> Vec<Level> {
        let levels = self.dominant_strikes(snapshot, |q| (q.pe_oi(), q.ce_oi()));
        debug!("Found {} support levels", levels.len());
        levels
    }

    /// Call-heavy strikes, strongest first.
    pub fn find_resistances(&self, snapshot: &ChainSnapshot) -> Vec<Level> {
        let levels = self.dominant_strikes(snapshot, |q| (q.ce_oi(), q.pe_oi()));
        debug!("Found {} resistance levels", levels.len());
        levels
    }

    /// Strikes whose combined OI clears the absolute magnet threshold,
    /// largest first.
    pub fn find_magnets(&self, snapshot: &ChainSnapshot) -> Vec<OiMagnet> {
        let full = self.config.magnet_full_confidence_oi.max(1) as f64;
        let mut magnets: Vec<OiMagnet> = snapshot
            .strikes()
            .iter()
            .filter(|q| q.total_oi() > self.config.magnet_min_oi)
            .map(|q| OiMagnet {
                strike: q.strike,
                total_oi: q.total_oi(),
                confidence: (q.total_oi() as f64 / full).min(1.0),
            })
            .collect();

        magnets.sort_by(|a, b| b.total_oi.cmp(&a.total_oi));
        magnets.truncate(self.config.max_magnets);
        magnets
    }

    /// Shared scan for supports and resistances. `legs` returns
    /// `(dominant_oi, other_oi)` for a strike.
    fn dominant_strikes<F>(&self, snapshot: &ChainSnapshot, legs: F) -> Vec<Level>
    where
        F: Fn(&StrikeQuote) -> (u64, u64),
    {
        let cap = self.config.strength_cap;
        let mut levels: Vec<Level> = snapshot
            .strikes()
            .iter()
            .filter_map(|q| {
                let (dominant, other) = legs(q);
                let dominates = dominant as f64 > other as f64 * self.config.dominance_ratio;
                if !dominates || dominant <= self.config.min_leg_oi {
                    return None;
                }
                // +1 keeps a zero opposing leg from dividing by zero
                let ratio = dominant as f64 / (other as f64 + 1.0);
                let strength = (ratio.min(cap) / cap).clamp(0.0, 1.0);
                Some(Level {
                    strike: q.strike,
                    strength,
                    put_oi: q.pe_oi(),
                    call_oi: q.ce_oi(),
                })
            })
            .collect();

        levels.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        levels.truncate(self.config.max_levels);
        levels
    }
}
