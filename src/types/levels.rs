//! Support/resistance, magnet and gap result types.

use serde::{Deserialize, Serialize};

/// A support or resistance strike derived from call/put OI imbalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub strike: f64,
    /// Normalised dominance of the heavier leg, in [0, 1].
    pub strength: f64,
    /// Put open interest at the strike.
    pub put_oi: u64,
    /// Call open interest at the strike.
    pub call_oi: u64,
}

/// High-OI strike found by absolute threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OiMagnet {
    pub strike: f64,
    /// Call plus put open interest.
    pub total_oi: u64,
    /// Total OI relative to the full-confidence threshold, in [0, 1].
    pub confidence: f64,
}

/// Strike whose total OI is a statistical outlier within its window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Magnet {
    pub strike: f64,
    pub total_oi: u64,
    /// Standard deviations above the window mean.
    pub z_score: f64,
    /// Total OI over the window mean (1 when the mean is 0).
    pub relative_strength: f64,
}

/// Low-OI stretch between two adjacent magnets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    /// Lower bounding magnet.
    pub from_strike: f64,
    /// Upper bounding magnet.
    pub to_strike: f64,
    /// Mean total OI of the strikes strictly between the magnets.
    pub avg_oi: f64,
    /// Interior mean OI over the bounding magnets' mean OI.
    pub oi_ratio: f64,
    pub strikes_in_gap: usize,
}

impl Gap {
    /// True when `price` lies strictly inside the gap.
    pub fn contains(&self, price: f64) -> bool {
        self.from_strike < price && price < self.to_strike
    }
}

/// Magnets and gaps for one snapshot, positioned against spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetMap {
    /// Ascending by strike.
    pub magnets: Vec<Magnet>,
    pub gaps: Vec<Gap>,
    /// Spot lies strictly inside one of the gaps.
    pub spot_in_gap: bool,
    /// Magnet closest to spot; the lower strike wins a tie.
    pub nearest_magnet: Option<Magnet>,
}
