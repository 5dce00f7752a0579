//! Max-OI migration types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strike carrying the largest open interest for one leg.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxOiStrike {
    /// `None` when no strike had positive OI on this leg.
    pub strike: Option<f64>,
    /// Open interest at that strike; 0 when unknown.
    pub oi: u64,
}

/// Dominant call/put strikes for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    pub max_ce: MaxOiStrike,
    pub max_pe: MaxOiStrike,
    /// Distance between the two strikes; 0 when either is unknown.
    pub distance: f64,
}

/// Direction of one leg's dominant strike over the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegTrend {
    Up,
    Down,
    /// Fitted, but the slope is within the threshold.
    Flat,
    /// Too few records know this leg's strike to fit it.
    Neutral,
}

/// Combined reading of the two leg trends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationRegime {
    /// Call writers moving down while put writers move up.
    Bullish,
    /// Call writers moving up while put writers move down.
    Bearish,
    /// Both legs moving up.
    Consolidation,
    Neutral,
}

/// Sign that the current migration is running out of steam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExhaustionSignal {
    /// The call leg went flat while the put leg did not.
    CeMigrationStall,
    /// The put leg went flat while the call leg did not.
    PeMigrationStall,
    /// Leg slopes differ by more than the divergence threshold.
    HighDivergence,
    /// Max call and put strikes are closer than the pinning distance.
    TightPinning,
}

impl fmt::Display for ExhaustionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CeMigrationStall => write!(f, "CE_MIGRATION_STALL"),
            Self::PeMigrationStall => write!(f, "PE_MIGRATION_STALL"),
            Self::HighDivergence => write!(f, "HIGH_DIVERGENCE"),
            Self::TightPinning => write!(f, "TIGHT_PINNING"),
        }
    }
}

/// Fitted trend of the dominant strikes across the tracked history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationTrend {
    pub ce_trend: LegTrend,
    pub pe_trend: LegTrend,
    pub overall: MigrationRegime,
    /// Strike points per snapshot; 0 when the leg could not be fitted.
    pub ce_slope: f64,
    pub pe_slope: f64,
    /// `|ce_slope - pe_slope|`; 0 unless both legs were fitted.
    pub divergence: f64,
    /// Mean absolute slope of the two legs.
    pub velocity: f64,
}

impl MigrationTrend {
    pub fn neutral() -> Self {
        Self {
            ce_trend: LegTrend::Neutral,
            pe_trend: LegTrend::Neutral,
            overall: MigrationRegime::Neutral,
            ce_slope: 0.0,
            pe_slope: 0.0,
            divergence: 0.0,
            velocity: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Up,
    Down,
}

/// One-step extrapolation of a trending leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedLevel {
    /// Current max strike moved one strike step in `direction`.
    pub strike: f64,
    pub direction: Direction,
    /// Absolute slope of the leg, in strike points per snapshot.
    pub confidence: f64,
}

/// Projected next strikes. Only a falling call leg or a rising put leg
/// is projected.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextLevels {
    pub ce: Option<ProjectedLevel>,
    pub pe: Option<ProjectedLevel>,
}

/// Result of feeding one snapshot to a migration tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationAnalysis {
    /// Record extracted from the snapshot just added.
    pub current_max_oi: MigrationRecord,
    pub migration_trend: MigrationTrend,
    pub exhaustion_signals: Vec<ExhaustionSignal>,
    /// Regime strength in [0, 1]; 0 for a neutral regime.
    pub trend_strength: f64,
    pub next_potential_level: NextLevels,
    /// Records held after this update.
    pub history_len: usize,
}
