//! Near-vs-far expiry level confirmation.
//!
//! A level that shows up in both the near and the next expiry is treated as
//! real positioning ("swing anchor"); one that exists only in the near expiry
//! is likely short-dated gamma positioning that fades into expiry.

use crate::config::AlignmentConfig;
use crate::services::levels::LevelDetector;
use crate::services::stats::mean;
use crate::types::{
    AlignedLevel, AlignedMagnet, AlignmentReport, AnchorType, ChainSnapshot, ClassifiedLevel,
    GammaSwingAssessment, Level, LevelAlignment, LevelClass, MagnetAlignment, OiMagnet,
    TradingImplication,
};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct AlignmentAnalyzer {
    detector: LevelDetector,
    config: AlignmentConfig,
}

impl AlignmentAnalyzer {
    pub fn new(detector: LevelDetector, config: AlignmentConfig) -> Self {
        Self { detector, config }
    }

    /// Compare levels and magnets between the near and far expiry.
    pub fn analyze(&self, near: &ChainSnapshot, far: &ChainSnapshot) -> AlignmentReport {
        let near_supports = self.detector.find_supports(near);
        let far_supports = self.detector.find_supports(far);
        let near_resistances = self.detector.find_resistances(near);
        let far_resistances = self.detector.find_resistances(far);
        let near_magnets = self.detector.find_magnets(near);
        let far_magnets = self.detector.find_magnets(far);

        let support_alignment = self.align_levels(&near_supports, &far_supports);
        let resistance_alignment = self.align_levels(&near_resistances, &far_resistances);
        let magnet_alignment = self.align_magnets(&near_magnets, &far_magnets);
        let overall_alignment_score =
            overall_score(&support_alignment, &resistance_alignment, &magnet_alignment);
        let gamma_vs_swing = self.gamma_vs_swing(&near_supports, &far_supports);

        debug!(
            "Alignment: {} supports, {} resistances, {} magnets matched (score {:.2})",
            support_alignment.alignment_count,
            resistance_alignment.alignment_count,
            magnet_alignment.alignment_count,
            overall_alignment_score
        );

        AlignmentReport {
            support_alignment,
            resistance_alignment,
            magnet_alignment,
            overall_alignment_score,
            gamma_vs_swing,
        }
    }

    fn within_tolerance(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.config.strike_tolerance
    }

    /// Every near/far pair within tolerance; a near level may match several
    /// far levels.
    pub fn align_levels(&self, near: &[Level], far: &[Level]) -> LevelAlignment {
        let mut aligned = Vec::new();
        for n in near {
            for f in far.iter().filter(|f| self.within_tolerance(n.strike, f.strike)) {
                let anchor = if f.strength > self.config.anchor_strength {
                    AnchorType::SwingAnchor
                } else {
                    AnchorType::GammaOnly
                };
                aligned.push(AlignedLevel {
                    strike: n.strike,
                    far_strike: f.strike,
                    near_strength: n.strength,
                    far_strength: f.strength,
                    alignment_score: n.strength.min(f.strength),
                    anchor,
                });
            }
        }

        let strong_anchor_count = aligned
            .iter()
            .filter(|a| a.anchor == AnchorType::SwingAnchor)
            .count();

        LevelAlignment {
            alignment_count: aligned.len(),
            strong_anchor_count,
            aligned,
        }
    }

    pub fn align_magnets(&self, near: &[OiMagnet], far: &[OiMagnet]) -> MagnetAlignment {
        let mut aligned = Vec::new();
        for n in near {
            for f in far.iter().filter(|f| self.within_tolerance(n.strike, f.strike)) {
                let hi = n.total_oi.max(f.total_oi) as f64;
                let lo = n.total_oi.min(f.total_oi) as f64;
                aligned.push(AlignedMagnet {
                    strike: n.strike,
                    far_strike: f.strike,
                    near_oi: n.total_oi,
                    far_oi: f.total_oi,
                    alignment_ratio: if hi > 0.0 { lo / hi } else { 0.0 },
                    confidence: n.confidence.min(f.confidence),
                });
            }
        }

        let ratios: Vec<f64> = aligned.iter().map(|m| m.alignment_ratio).collect();
        MagnetAlignment {
            alignment_count: aligned.len(),
            average_alignment_ratio: mean(&ratios),
            aligned,
        }
    }

    /// Split near-expiry supports by whether the far expiry confirms them.
    pub fn gamma_vs_swing(&self, near: &[Level], far: &[Level]) -> GammaSwingAssessment {
        let (swing, gamma): (Vec<ClassifiedLevel>, Vec<ClassifiedLevel>) = near
            .iter()
            .map(|n| {
                let confirmed = far.iter().any(|f| self.within_tolerance(n.strike, f.strike));
                ClassifiedLevel {
                    strike: n.strike,
                    strength: n.strength,
                    class: if confirmed {
                        LevelClass::SwingAnchor
                    } else {
                        LevelClass::GammaGame
                    },
                }
            })
            .partition(|l| l.class == LevelClass::SwingAnchor);

        let total = near.len().max(1) as f64;
        let trading_implication = if swing.len() > gamma.len() {
            TradingImplication::TrustLevels
        } else {
            TradingImplication::FadeLevels
        };

        GammaSwingAssessment {
            gamma_game_ratio: gamma.len() as f64 / total,
            swing_anchor_ratio: swing.len() as f64 / total,
            gamma_only_levels: gamma,
            swing_anchor_levels: swing,
            trading_implication,
        }
    }
}

/// Unweighted mean of whichever components had matches; 0 when none did.
fn overall_score(
    supports: &LevelAlignment,
    resistances: &LevelAlignment,
    magnets: &MagnetAlignment,
) -> f64 {
    let mut scores = Vec::with_capacity(3);
    if let Some(s) = supports.strong_anchor_fraction() {
        scores.push(s);
    }
    if let Some(r) = resistances.strong_anchor_fraction() {
        scores.push(r);
    }
    if !magnets.aligned.is_empty() {
        scores.push(magnets.average_alignment_ratio);
    }
    mean(&scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StrikeQuote;

    fn level(strike: f64, strength: f64) -> Level {
        Level {
            strike,
            strength,
            put_oi: 0,
            call_oi: 0,
        }
    }

    #[test]
    fn test_tolerance_is_inclusive() {
        let analyzer = AlignmentAnalyzer::default();
        let result = analyzer.align_levels(
            &[level(20_000.0, 0.9)],
            &[level(20_050.0, 0.8), level(20_051.0, 0.9)],
        );
        assert_eq!(result.alignment_count, 1);
        assert_eq!(result.aligned[0].far_strike, 20_050.0);
        assert_eq!(result.aligned[0].anchor, AnchorType::SwingAnchor);
        assert!((result.aligned[0].alignment_score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_weak_far_level_is_gamma_only() {
        let analyzer = AlignmentAnalyzer::default();
        let result = analyzer.align_levels(&[level(20_000.0, 0.9)], &[level(20_000.0, 0.7)]);
        assert_eq!(result.aligned[0].anchor, AnchorType::GammaOnly);
        assert_eq!(result.strong_anchor_count, 0);
    }

    #[test]
    fn test_magnet_ratio_and_confidence() {
        let analyzer = AlignmentAnalyzer::default();
        let near = [OiMagnet {
            strike: 20_000.0,
            total_oi: 4_000_000,
            confidence: 0.8,
        }];
        let far = [OiMagnet {
            strike: 20_050.0,
            total_oi: 3_000_000,
            confidence: 0.6,
        }];
        let result = analyzer.align_magnets(&near, &far);
        assert_eq!(result.alignment_count, 1);
        assert!((result.aligned[0].alignment_ratio - 0.75).abs() < 1e-12);
        assert!((result.aligned[0].confidence - 0.6).abs() < 1e-12);
        assert!((result.average_alignment_ratio - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_gamma_vs_swing_implication() {
        let analyzer = AlignmentAnalyzer::default();
        let near = [level(19_800.0, 0.9), level(19_900.0, 0.6), level(20_500.0, 0.5)];
        let far = [level(19_850.0, 0.8), level(19_950.0, 0.4)];

        let result = analyzer.gamma_vs_swing(&near, &far);
        assert_eq!(result.swing_anchor_levels.len(), 2);
        assert_eq!(result.gamma_only_levels.len(), 1);
        assert_eq!(result.gamma_only_levels[0].strike, 20_500.0);
        assert_eq!(result.trading_implication, TradingImplication::TrustLevels);

        let empty = analyzer.gamma_vs_swing(&[], &far);
        assert_eq!(empty.trading_implication, TradingImplication::FadeLevels);
        assert_eq!(empty.gamma_game_ratio, 0.0);
    }

    #[test]
    fn test_no_matches_scores_zero() {
        let analyzer = AlignmentAnalyzer::default();
        let near = ChainSnapshot::new(
            20_000.0,
            vec![StrikeQuote::with_legs(20_000.0, 50_000, 0.2, 400_000, 0.2)],
        )
        .unwrap();
        let far = ChainSnapshot::new(
            20_000.0,
            vec![StrikeQuote::with_legs(21_000.0, 50_000, 0.2, 400_000, 0.2)],
        )
        .unwrap();

        let report = analyzer.analyze(&near, &far);
        assert_eq!(report.overall_alignment_score, 0.0);
        assert_eq!(report.gamma_vs_swing.gamma_only_levels.len(), 1);
    }

    #[test]
    fn test_overall_score_skips_empty_terms() {
        let analyzer = AlignmentAnalyzer::default();
        let supports = analyzer.align_levels(
            &[level(20_000.0, 0.9)],
            &[level(20_000.0, 0.8), level(20_050.0, 0.5)],
        );
        let resistances = analyzer.align_levels(&[level(20_500.0, 0.9)], &[]);
        let magnets = analyzer.align_magnets(
            &[OiMagnet {
                strike: 20_000.0,
                total_oi: 4_000_000,
                confidence: 0.8,
            }],
            &[OiMagnet {
                strike: 20_000.0,
                total_oi: 3_000_000,
                confidence: 0.6,
            }],
        );

        assert_eq!(supports.alignment_count, 2);
        assert_eq!(supports.strong_anchor_count, 1);
        assert_eq!(resistances.strong_anchor_fraction(), None);

        let score = overall_score(&supports, &resistances, &magnets);
        assert!((score - 0.625).abs() < 1e-12);
    }
}
