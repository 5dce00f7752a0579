//! Cross-expiry alignment result types.

use serde::{Deserialize, Serialize};

/// Whether a matched level is confirmed by the far expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnchorType {
    /// The far level is stronger than the anchor threshold.
    SwingAnchor,
    /// The far level exists but is weak.
    GammaOnly,
}

/// Classification of a near-expiry support in the gamma-vs-swing view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LevelClass {
    /// A strong far-expiry support sits within tolerance.
    SwingAnchor,
    /// Only near-expiry positioning backs the level.
    GammaGame,
}

/// How much weight to give near-expiry supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingImplication {
    /// Swing anchors outnumber gamma-only levels.
    TrustLevels,
    FadeLevels,
}

/// A near-expiry level paired with a far-expiry level within tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedLevel {
    /// Near-expiry strike.
    pub strike: f64,
    pub far_strike: f64,
    pub near_strength: f64,
    pub far_strength: f64,
    /// The weaker of the two strengths.
    pub alignment_score: f64,
    pub anchor: AnchorType,
}

/// Matches between near and far levels of one kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelAlignment {
    pub aligned: Vec<AlignedLevel>,
    pub alignment_count: usize,
    /// Pairs tagged [`AnchorType::SwingAnchor`].
    pub strong_anchor_count: usize,
}

impl LevelAlignment {
    /// Fraction of matched pairs tagged as swing anchors.
    pub fn strong_anchor_fraction(&self) -> Option<f64> {
        if self.aligned.is_empty() {
            None
        } else {
            Some(self.strong_anchor_count as f64 / self.aligned.len() as f64)
        }
    }
}

/// A near-expiry magnet paired with a far-expiry magnet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedMagnet {
    pub strike: f64,
    pub far_strike: f64,
    pub near_oi: u64,
    pub far_oi: u64,
    /// Smaller total OI over the larger, in [0, 1].
    pub alignment_ratio: f64,
    /// The lower of the two magnet confidences.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetAlignment {
    pub aligned: Vec<AlignedMagnet>,
    pub alignment_count: usize,
    /// 0 when nothing aligned.
    pub average_alignment_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedLevel {
    pub strike: f64,
    pub strength: f64,
    pub class: LevelClass,
}

/// Near-expiry supports split by far-expiry confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaSwingAssessment {
    pub gamma_only_levels: Vec<ClassifiedLevel>,
    pub swing_anchor_levels: Vec<ClassifiedLevel>,
    /// Share of near supports that are gamma-only; 0 with no supports.
    pub gamma_game_ratio: f64,
    pub swing_anchor_ratio: f64,
    pub trading_implication: TradingImplication,
}

/// Near-vs-far expiry comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentReport {
    pub support_alignment: LevelAlignment,
    pub resistance_alignment: LevelAlignment,
    pub magnet_alignment: MagnetAlignment,
    /// Mean of the swing-anchor fractions and the magnet ratio, counting
    /// only the terms that had matches.
    pub overall_alignment_score: f64,
    pub gamma_vs_swing: GammaSwingAssessment,
}
