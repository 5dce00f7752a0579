//! Combined engine output and stored history entries.

use super::{
    AlignmentReport, ChainSnapshot, Level, MagnetMap, MigrationAnalysis, SkewReport, TimePressure,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the engine derives from one analysis cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReport {
    pub analysed_at: NaiveDateTime,
    pub spot_price: f64,
    pub supports: Vec<Level>,
    pub resistances: Vec<Level>,
    pub magnet_map: MagnetMap,
    pub skew: SkewReport,
    pub alignment: Option<AlignmentReport>,
    pub migration: Option<MigrationAnalysis>,
    pub time_pressure: TimePressure,
}

/// A snapshot as kept by the history collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSnapshot {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub snapshot: ChainSnapshot,
}

impl StoredSnapshot {
    pub fn new(symbol: impl Into<String>, snapshot: ChainSnapshot) -> Self {
        Self {
            timestamp: Utc::now(),
            symbol: symbol.into(),
            snapshot,
        }
    }
}
