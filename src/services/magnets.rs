//! Magnet strikes and low-OI gaps via sliding-window z-scores.
//!
//! Unlike the threshold magnets in [`super::levels`], these are judged
//! against their own neighbourhood, so a modest strike in a thin part of the
//! ladder can still stand out.

use crate::config::MagnetConfig;
use crate::services::stats::{mean, ratio_or, std_dev};
use crate::types::{ChainSnapshot, Gap, Magnet, MagnetMap};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct MagnetGapDetector {
    config: MagnetConfig,
}

impl MagnetGapDetector {
    pub fn new(config: MagnetConfig) -> Self {
        Self { config }
    }

    /// Magnets, gaps and where spot sits relative to them.
    pub fn detect(&self, snapshot: &ChainSnapshot) -> MagnetMap {
        let magnets = self.find_magnets(snapshot);
        let gaps = self.find_gaps(snapshot, &magnets);
        let spot = snapshot.spot_price();

        debug!(
            "Detected {} magnets and {} gaps around spot {}",
            magnets.len(),
            gaps.len(),
            spot
        );

        MagnetMap {
            spot_in_gap: spot_in_gap(spot, &gaps),
            nearest_magnet: nearest_magnet(spot, &magnets).cloned(),
            magnets,
            gaps,
        }
    }

    /// Strikes whose total OI exceeds `mean + k·std` of their window,
    /// highest z-score first.
    pub fn find_magnets(&self, snapshot: &ChainSnapshot) -> Vec<Magnet> {
        let w = self.config.window;
        let strikes = snapshot.strikes();
        let ladder = snapshot.total_oi_ladder();

        if ladder.len() < 2 * w + 1 {
            return Vec::new();
        }

        let mut magnets: Vec<Magnet> = (w..ladder.len() - w)
            .filter_map(|i| {
                let window = &ladder[i - w..=i + w];
                let oi = ladder[i];
                let window_mean = mean(window);
                let window_std = std_dev(window, window_mean);

                if oi <= window_mean + self.config.sigma_threshold * window_std {
                    return None;
                }

                let z_score = if window_std > 0.0 {
                    (oi - window_mean) / window_std
                } else {
                    0.0
                };

                Some(Magnet {
                    strike: strikes[i].strike,
                    total_oi: strikes[i].total_oi(),
                    z_score,
                    relative_strength: ratio_or(oi, window_mean, 1.0),
                })
            })
            .collect();

        magnets.sort_by(|a, b| b.z_score.total_cmp(&a.z_score));
        magnets.truncate(self.config.max_magnets);
        magnets
    }

    /// Low-OI stretches between strike-adjacent magnets.
    pub fn find_gaps(&self, snapshot: &ChainSnapshot, magnets: &[Magnet]) -> Vec<Gap> {
        let ladder = snapshot.total_oi_ladder();

        let mut bounds: Vec<(usize, &Magnet)> = magnets
            .iter()
            .filter_map(|m| snapshot.position(m.strike).map(|idx| (idx, m)))
            .collect();
        bounds.sort_by_key(|(idx, _)| *idx);

        bounds
            .windows(2)
            .filter_map(|pair| {
                let (lo_idx, lo) = pair[0];
                let (hi_idx, hi) = pair[1];
                if hi_idx <= lo_idx + 1 {
                    return None;
                }

                let interior = &ladder[lo_idx + 1..hi_idx];
                let avg_oi = mean(interior);
                let avg_magnet_oi = (lo.total_oi as f64 + hi.total_oi as f64) / 2.0;

                if avg_oi >= self.config.gap_ratio * avg_magnet_oi {
                    return None;
                }

                Some(Gap {
                    from_strike: lo.strike,
                    to_strike: hi.strike,
                    avg_oi,
                    oi_ratio: ratio_or(avg_oi, avg_magnet_oi, 0.0),
                    strikes_in_gap: interior.len(),
                })
            })
            .collect()
    }
}

/// True when spot sits strictly inside any gap.
pub fn spot_in_gap(spot: f64, gaps: &[Gap]) -> bool {
    gaps.iter().any(|g| g.contains(spot))
}

/// Magnet closest to spot; the first one wins a tie.
pub fn nearest_magnet(spot: f64, magnets: &[Magnet]) -> Option<&Magnet> {
    let mut best: Option<&Magnet> = None;
    for magnet in magnets {
        match best {
            Some(b) if (magnet.strike - spot).abs() >= (b.strike - spot).abs() => {}
            _ => best = Some(magnet),
        }
    }
    best
}
