//! Implied-volatility skew result types.

use serde::{Deserialize, Serialize};

/// Steepness of the IV curve on each side of ATM.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IvGradient {
    /// Mean gradient of call IV over the strikes below ATM.
    pub left_steepness: f64,
    /// Mean gradient of put IV over the strikes above ATM.
    pub right_steepness: f64,
    /// Absolute difference of mean IV between the two sides.
    pub asymmetry: f64,
}

/// Whether a magnet's IV sits in line with its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IvStability {
    /// Both leg ratios are under the stability ratio.
    Stable,
    /// At least one leg is bid up against its neighbours.
    Volatile,
}

/// IV at a magnet strike relative to its neighbourhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetSkew {
    pub strike: f64,
    /// Call IV over the mean call IV of the neighbouring strikes.
    pub ce_iv_ratio: f64,
    /// Put IV over the mean put IV of the neighbouring strikes.
    pub pe_iv_ratio: f64,
    pub iv_stability: IvStability,
}

/// Which side of the book is paying up for protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkewType {
    /// Calls priced richer than puts.
    CeFear,
    /// Puts priced richer than calls.
    PeFear,
    Balanced,
}

/// Call-vs-put IV at one near-ATM strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneSidedSkew {
    pub strike: f64,
    pub ce_iv: f64,
    pub pe_iv: f64,
    /// Call IV over put IV.
    pub skew_ratio: f64,
    pub skew_type: SkewType,
    /// Distance of the ratio from 1.
    pub fear_strength: f64,
}

/// Strike with IV well below its local window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IvCrushPocket {
    pub strike: f64,
    pub ce_iv: f64,
    pub pe_iv: f64,
    /// Mean call IV over the surrounding window.
    pub window_avg: f64,
    /// Call IV z-score against the window; 0 for a flat window.
    pub z_score: f64,
    /// Fraction by which call IV undercuts the window mean.
    pub crush_strength: f64,
}

/// Localised IV spike near spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FearZone {
    pub strike: f64,
    /// Leg whose IV spiked. Calls are checked first.
    pub fear_type: SkewType,
    /// Relative excess of the spiking leg over its local mean.
    pub strength: f64,
    /// Higher of the two leg IVs at the strike.
    pub current_iv: f64,
    /// Higher of the two local mean IVs.
    pub local_avg: f64,
}

/// Fear zones split by side of spot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FearZones {
    /// Zones at strikes above spot.
    pub above: Vec<FearZone>,
    /// Zones at or below spot.
    pub below: Vec<FearZone>,
}

impl FearZones {
    pub fn is_empty(&self) -> bool {
        self.above.is_empty() && self.below.is_empty()
    }
}

/// IV metadata for a magnet strike against a price-width neighbourhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetIvPocket {
    pub strike: f64,
    pub ce_iv: f64,
    pub pe_iv: f64,
    /// Call IV minus put IV.
    pub iv_skew: f64,
    /// Mean of the per-leg median IVs around the magnet, zero IVs excluded.
    pub neighbourhood_median_iv: f64,
    /// Combined IV is below the pocket ratio times the median.
    pub is_low_iv_pocket: bool,
}

/// Full skew picture for one snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkewReport {
    /// `None` for an empty chain.
    pub atm_strike: Option<f64>,
    pub iv_gradient: IvGradient,
    pub magnet_skew: Vec<MagnetSkew>,
    pub one_sided_skew: Vec<OneSidedSkew>,
    pub iv_crush_pockets: Vec<IvCrushPocket>,
    pub fear_zones: FearZones,
    pub iv_pockets: Vec<MagnetIvPocket>,
}
