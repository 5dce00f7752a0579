//! Futures build-up types.

use serde::{Deserialize, Serialize};

/// Futures instrument classes carried by the exchange bhavcopy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentKind {
    /// Stock future.
    Futstk,
    /// Index future.
    Futidx,
    /// Options and anything else; ignored by build-up analysis.
    #[serde(other)]
    Other,
}

impl InstrumentKind {
    pub fn is_future(&self) -> bool {
        matches!(self, InstrumentKind::Futstk | InstrumentKind::Futidx)
    }
}

/// One row of end-of-day derivatives data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesRow {
    pub instrument: InstrumentKind,
    pub symbol: String,
    pub oi_change: f64,
    pub price_change: f64,
}

/// Interpretation of joint OI and price movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Buildup {
    LongBuildup,
    ShortBuildup,
    ShortCovering,
    LongUnwinding,
    Neutral,
}

impl Buildup {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LongBuildup => "Long Buildup",
            Self::ShortBuildup => "Short Buildup",
            Self::ShortCovering => "Short Covering",
            Self::LongUnwinding => "Long Unwinding",
            Self::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildupSignal {
    pub symbol: String,
    pub signal: Buildup,
    pub oi_change: f64,
    pub price_change: f64,
}
