//! Trading-session phase and pressure types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete phase of the trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimePhase {
    /// Market open until 10:30.
    OpeningPhase,
    /// 10:30 until 11:30.
    MidMorning,
    /// 11:30 until 13:30, when option sellers are most at ease.
    SellerComfortWindow,
    /// 13:30 until 14:30.
    PostLunch,
    /// 14:30 until the close.
    GammaGamePhase,
    /// Outside session hours.
    Closed,
}

impl TimePhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OpeningPhase => "OPENING_PHASE",
            Self::MidMorning => "MID_MORNING",
            Self::SellerComfortWindow => "SELLER_COMFORT_WINDOW",
            Self::PostLunch => "POST_LUNCH",
            Self::GammaGamePhase => "GAMMA_GAME_PHASE",
            Self::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for TimePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pull of high-OI strikes on spot late in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinningPressure {
    pub pressure: f64,
    /// High-OI strikes nearest to spot, at most `max_pin_targets`.
    pub target_strikes: Vec<f64>,
    /// At least two strikes qualified as targets.
    pub strong_pin: bool,
}

/// Time-of-day pressure scores for one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePressure {
    pub time_phase: TimePhase,
    /// Elapsed fraction of the session, clamped to [0, 1].
    pub time_into_session: f64,
    pub seller_aggression: f64,
    pub pinning_pressure: PinningPressure,
    pub breakout_probability: f64,
    pub gamma_risk: f64,
}
