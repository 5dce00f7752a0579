//! Implied-volatility skew analysis.
//!
//! Five independent views of one snapshot's IV surface, plus magnet IV
//! pockets:
//! - gradient of the wings either side of ATM
//! - magnet IV against its immediate neighbours
//! - call-vs-put IV at the ATM strikes
//! - crush pockets (IV well below its window)
//! - fear zones (IV spikes near spot)
//!
//! An IV of 0 means the leg was not traded and is left out of every mean.

use crate::config::SkewConfig;
use crate::services::stats::{gradient, mean, median, ratio_or, std_dev};
use crate::types::{
    ChainSnapshot, FearZone, FearZones, IvCrushPocket, IvGradient, IvStability, MagnetIvPocket,
    MagnetSkew, OneSidedSkew, SkewReport, SkewType, StrikeQuote,
};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct SkewAnalyzer {
    config: SkewConfig,
}

impl SkewAnalyzer {
    pub fn new(config: SkewConfig) -> Self {
        Self { config }
    }

    /// Run every skew view against `magnet_strikes`.
    pub fn analyze(&self, snapshot: &ChainSnapshot, magnet_strikes: &[f64]) -> SkewReport {
        let Some(atm_idx) = snapshot.atm_index() else {
            debug!("Empty chain, skipping skew analysis");
            return SkewReport::default();
        };

        SkewReport {
            atm_strike: Some(snapshot.strikes()[atm_idx].strike),
            iv_gradient: self.iv_gradient(snapshot),
            magnet_skew: self.magnet_skew(snapshot, magnet_strikes),
            one_sided_skew: self.one_sided_skew(snapshot),
            iv_crush_pockets: self.iv_crush_pockets(snapshot),
            fear_zones: self.fear_zones(snapshot),
            iv_pockets: self.magnet_iv_pockets(snapshot, magnet_strikes),
        }
    }

    /// Call-IV slope below ATM and put-IV slope above ATM.
    pub fn iv_gradient(&self, snapshot: &ChainSnapshot) -> IvGradient {
        let Some(atm) = snapshot.atm_index() else {
            return IvGradient::default();
        };
        let strikes = snapshot.strikes();
        let n = self.config.gradient_strikes;

        let left: Vec<f64> = strikes[atm.saturating_sub(n)..atm]
            .iter()
            .map(StrikeQuote::ce_iv)
            .filter(|iv| *iv > 0.0)
            .collect();
        let right_end = (atm + n + 1).min(strikes.len());
        let right: Vec<f64> = strikes[atm + 1..right_end]
            .iter()
            .map(StrikeQuote::pe_iv)
            .filter(|iv| *iv > 0.0)
            .collect();

        let asymmetry = if left.is_empty() || right.is_empty() {
            0.0
        } else {
            (mean(&left) - mean(&right)).abs()
        };

        IvGradient {
            left_steepness: mean(&gradient(&left)),
            right_steepness: mean(&gradient(&right)),
            asymmetry,
        }
    }

    /// IV at each magnet relative to its ±n neighbours.
    pub fn magnet_skew(&self, snapshot: &ChainSnapshot, magnet_strikes: &[f64]) -> Vec<MagnetSkew> {
        let strikes = snapshot.strikes();
        let mut out: Vec<MagnetSkew> = Vec::new();

        for &magnet in magnet_strikes {
            let Some(idx) = snapshot.position(magnet) else {
                continue;
            };
            if out.iter().any(|m| m.strike == magnet) {
                continue;
            }

            let (ce_local, pe_local) = self.neighbour_ivs(strikes, idx);
            let ce_avg = mean(&ce_local);
            let pe_avg = mean(&pe_local);

            let ce_iv_ratio = ratio_or(strikes[idx].ce_iv(), ce_avg, 1.0);
            let pe_iv_ratio = ratio_or(strikes[idx].pe_iv(), pe_avg, 1.0);
            let stable = ce_iv_ratio < self.config.stability_ratio
                && pe_iv_ratio < self.config.stability_ratio;

            out.push(MagnetSkew {
                strike: magnet,
                ce_iv_ratio,
                pe_iv_ratio,
                iv_stability: if stable {
                    IvStability::Stable
                } else {
                    IvStability::Volatile
                },
            });
        }

        out
    }

    /// Call/put IV ratio at ATM and the strike either side.
    pub fn one_sided_skew(&self, snapshot: &ChainSnapshot) -> Vec<OneSidedSkew> {
        let Some(atm) = snapshot.atm_index() else {
            return Vec::new();
        };
        let strikes = snapshot.strikes();
        let end = (atm + 2).min(strikes.len());

        strikes[atm.saturating_sub(1)..end]
            .iter()
            .filter_map(|q| {
                let (ce_iv, pe_iv) = (q.ce_iv(), q.pe_iv());
                if ce_iv <= 0.0 || pe_iv <= 0.0 {
                    return None;
                }
                let skew_ratio = ce_iv / pe_iv;
                Some(OneSidedSkew {
                    strike: q.strike,
                    ce_iv,
                    pe_iv,
                    skew_ratio,
                    skew_type: self.classify_ratio(skew_ratio),
                    fear_strength: (skew_ratio - 1.0).abs(),
                })
            })
            .collect()
    }

    /// Strikes where both legs trade at least one std below their window.
    pub fn iv_crush_pockets(&self, snapshot: &ChainSnapshot) -> Vec<IvCrushPocket> {
        let strikes = snapshot.strikes();
        let w = self.config.crush_window;
        if strikes.len() < 2 * w + 1 {
            return Vec::new();
        }

        (w..strikes.len() - w)
            .filter_map(|i| {
                let window_ivs: Vec<f64> = strikes[i - w..=i + w]
                    .iter()
                    .flat_map(|q| [q.ce_iv(), q.pe_iv()])
                    .filter(|iv| *iv > 0.0)
                    .collect();
                if window_ivs.is_empty() {
                    return None;
                }

                let (ce_iv, pe_iv) = (strikes[i].ce_iv(), strikes[i].pe_iv());
                if ce_iv <= 0.0 || pe_iv <= 0.0 {
                    return None;
                }

                let window_avg = mean(&window_ivs);
                let window_std = std_dev(&window_ivs, window_avg);
                let floor = window_avg - window_std;
                if ce_iv >= floor || pe_iv >= floor {
                    return None;
                }

                Some(IvCrushPocket {
                    strike: strikes[i].strike,
                    ce_iv,
                    pe_iv,
                    window_avg,
                    z_score: if window_std > 0.0 {
                        (ce_iv - window_avg) / window_std
                    } else {
                        0.0
                    },
                    crush_strength: ratio_or(window_avg - ce_iv, window_avg, 0.0),
                })
            })
            .collect()
    }

    /// Local IV spikes within `fear_zone_span` strikes of ATM, split by side
    /// of spot.
    pub fn fear_zones(&self, snapshot: &ChainSnapshot) -> FearZones {
        let mut zones = FearZones::default();
        let Some(atm) = snapshot.atm_index() else {
            return zones;
        };
        let strikes = snapshot.strikes();
        let span = self.config.fear_zone_span;
        let spike = self.config.fear_spike_ratio;
        let spot = snapshot.spot_price();

        let end = (atm + span + 1).min(strikes.len());
        for i in atm.saturating_sub(span)..end {
            let quote = &strikes[i];
            let (ce_local, pe_local) = self.neighbour_ivs(strikes, i);
            if ce_local.is_empty() || pe_local.is_empty() {
                continue;
            }

            let avg_ce = mean(&ce_local);
            let avg_pe = mean(&pe_local);
            let (ce_iv, pe_iv) = (quote.ce_iv(), quote.pe_iv());

            let (fear_type, strength) = if ce_iv > avg_ce * spike {
                (SkewType::CeFear, (ce_iv - avg_ce) / avg_ce)
            } else if pe_iv > avg_pe * spike {
                (SkewType::PeFear, (pe_iv - avg_pe) / avg_pe)
            } else {
                continue;
            };

            let zone = FearZone {
                strike: quote.strike,
                fear_type,
                strength,
                current_iv: ce_iv.max(pe_iv),
                local_avg: avg_ce.max(avg_pe),
            };

            if quote.strike > spot {
                zones.above.push(zone);
            } else {
                zones.below.push(zone);
            }
        }

        zones
    }

    /// IV metadata for each magnet against strikes within a fixed price width.
    pub fn magnet_iv_pockets(
        &self,
        snapshot: &ChainSnapshot,
        magnet_strikes: &[f64],
    ) -> Vec<MagnetIvPocket> {
        let width = self.config.pocket_neighbour_width;
        let mut out: Vec<MagnetIvPocket> = Vec::new();

        for &magnet in magnet_strikes {
            let Some(idx) = snapshot.position(magnet) else {
                continue;
            };
            if out.iter().any(|p| p.strike == magnet) {
                continue;
            }

            let quote = &snapshot.strikes()[idx];
            let (ce_iv, pe_iv) = (quote.ce_iv(), quote.pe_iv());

            let neighbours = snapshot
                .strikes()
                .iter()
                .filter(|q| (q.strike - magnet).abs() <= width);
            let (ce_ivs, pe_ivs): (Vec<f64>, Vec<f64>) =
                neighbours.map(|q| (q.ce_iv(), q.pe_iv())).unzip();
            let ce_ivs: Vec<f64> = ce_ivs.into_iter().filter(|iv| *iv > 0.0).collect();
            let pe_ivs: Vec<f64> = pe_ivs.into_iter().filter(|iv| *iv > 0.0).collect();

            let medians: Vec<f64> = [&ce_ivs, &pe_ivs]
                .into_iter()
                .filter(|ivs| !ivs.is_empty())
                .map(|ivs| median(ivs))
                .collect();
            let median_iv = mean(&medians);

            out.push(MagnetIvPocket {
                strike: magnet,
                ce_iv,
                pe_iv,
                iv_skew: ce_iv - pe_iv,
                neighbourhood_median_iv: median_iv,
                is_low_iv_pocket: median_iv > 0.0
                    && ce_iv + pe_iv < self.config.pocket_ratio * median_iv,
            });
        }

        out
    }

    fn classify_ratio(&self, ratio: f64) -> SkewType {
        if ratio > self.config.ce_fear_ratio {
            SkewType::CeFear
        } else if ratio < self.config.pe_fear_ratio {
            SkewType::PeFear
        } else {
            SkewType::Balanced
        }
    }

    /// Positive call and put IVs of the ±`neighbourhood` strikes around
    /// `idx`, excluding `idx` itself.
    fn neighbour_ivs(&self, strikes: &[StrikeQuote], idx: usize) -> (Vec<f64>, Vec<f64>) {
        let n = self.config.neighbourhood;
        let end = (idx + n + 1).min(strikes.len());
        let mut ce = Vec::new();
        let mut pe = Vec::new();
        for j in idx.saturating_sub(n)..end {
            if j == idx {
                continue;
            }
            if strikes[j].ce_iv() > 0.0 {
                ce.push(strikes[j].ce_iv());
            }
            if strikes[j].pe_iv() > 0.0 {
                pe.push(strikes[j].pe_iv());
            }
        }
        (ce, pe)
    }
}
