use crate::error::{ChainError, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Thresholds for OI-imbalance levels and threshold magnets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    /// Heavier leg must exceed the lighter one by this factor.
    pub dominance_ratio: f64,
    /// Absolute OI floor for the heavier leg.
    pub min_leg_oi: u64,
    /// Dominance ratio that maps to strength 1.0.
    pub strength_cap: f64,
    /// Maximum supports (and resistances) returned.
    pub max_levels: usize,
    /// Total OI a strike needs to count as a threshold magnet.
    pub magnet_min_oi: u64,
    /// Total OI at which magnet confidence saturates.
    pub magnet_full_confidence_oi: u64,
    pub max_magnets: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            dominance_ratio: 1.5,
            min_leg_oi: 100_000,
            strength_cap: 5.0,
            max_levels: 5,
            magnet_min_oi: 2_000_000,
            magnet_full_confidence_oi: 5_000_000,
            max_magnets: 3,
        }
    }
}

/// Sliding-window magnet and gap detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetConfig {
    /// Neighbour strikes on each side of the evaluated strike.
    pub window: usize,
    /// Standard deviations above the window mean.
    pub sigma_threshold: f64,
    pub max_magnets: usize,
    /// Interior mean OI below this fraction of the magnets' mean is a gap.
    pub gap_ratio: f64,
}

impl Default for MagnetConfig {
    fn default() -> Self {
        Self {
            window: 5,
            sigma_threshold: 2.0,
            max_magnets: 5,
            gap_ratio: 0.3,
        }
    }
}

/// IV skew thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkewConfig {
    /// Strikes on each side of ATM used for the gradient.
    pub gradient_strikes: usize,
    /// Neighbour strikes on each side for magnet and fear-zone comparisons.
    pub neighbourhood: usize,
    /// Magnet IV below this fraction of its neighbourhood is stable.
    pub stability_ratio: f64,
    pub ce_fear_ratio: f64,
    pub pe_fear_ratio: f64,
    /// Half-width (in strikes) of the crush-pocket window.
    pub crush_window: usize,
    /// Strikes on each side of ATM scanned for fear zones.
    pub fear_zone_span: usize,
    /// IV above this multiple of the local mean is a fear spike.
    pub fear_spike_ratio: f64,
    /// Price distance used for magnet IV pocket neighbourhoods.
    pub pocket_neighbour_width: f64,
    /// Combined magnet IV below this fraction of the median is a pocket.
    pub pocket_ratio: f64,
}

impl Default for SkewConfig {
    fn default() -> Self {
        Self {
            gradient_strikes: 5,
            neighbourhood: 2,
            stability_ratio: 0.9,
            ce_fear_ratio: 1.2,
            pe_fear_ratio: 0.8,
            crush_window: 2,
            fear_zone_span: 5,
            fear_spike_ratio: 1.3,
            pocket_neighbour_width: 200.0,
            pocket_ratio: 0.7,
        }
    }
}

/// Cross-expiry matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentConfig {
    /// Maximum strike distance for a near/far match.
    pub strike_tolerance: f64,
    /// Far-expiry strength above which a match is a swing anchor.
    pub anchor_strength: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            strike_tolerance: 50.0,
            anchor_strength: 0.7,
        }
    }
}

/// Max-OI migration tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationConfig {
    /// History capacity in snapshots.
    pub track_period: usize,
    /// Records needed before a trend is fitted.
    pub min_records: usize,
    /// Absolute slope separating UP/DOWN from FLAT.
    pub slope_threshold: f64,
    pub divergence_threshold: f64,
    /// Call/put max-strike distance below which pinning is flagged.
    pub pinning_distance: f64,
    /// Strike spacing used for next-level projection.
    pub strike_step: f64,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            track_period: 30,
            min_records: 3,
            slope_threshold: 0.5,
            divergence_threshold: 1.0,
            pinning_distance: 100.0,
            strike_step: 50.0,
        }
    }
}

/// Session hours and pinning scan parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub market_open: NaiveTime,
    pub market_close: NaiveTime,
    /// Price distance from spot scanned for pin targets.
    pub pin_distance: f64,
    /// Total OI a strike needs to be a pin target.
    pub pin_min_oi: u64,
    pub max_pin_targets: usize,
    /// Session fraction from which pinning is scored against targets.
    pub pin_onset: f64,
    /// Pressure before the onset, and the starting point after it.
    pub base_pin_pressure: f64,
    /// Pressure after the onset when no strike qualifies as a target.
    pub untargeted_pin_pressure: f64,
    pub max_pin_pressure: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            market_open: hm(9, 15),
            market_close: hm(15, 30),
            pin_distance: 100.0,
            pin_min_oi: 1_000_000,
            max_pin_targets: 3,
            pin_onset: 0.8,
            base_pin_pressure: 0.3,
            untargeted_pin_pressure: 0.2,
            max_pin_pressure: 0.9,
        }
    }
}

impl SessionConfig {
    /// Reject sessions that close at or before they open.
    pub fn validate(&self) -> Result<()> {
        if self.market_close <= self.market_open {
            return Err(ChainError::InvalidSession(format!(
                "close {} is not after open {}",
                self.market_close, self.market_open
            )));
        }
        Ok(())
    }

    /// Session length in seconds.
    pub fn length_seconds(&self) -> i64 {
        (self.market_close - self.market_open).num_seconds()
    }
}

/// Every policy constant used by the analyzers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsConfig {
    pub levels: LevelConfig,
    pub magnets: MagnetConfig,
    pub skew: SkewConfig,
    pub alignment: AlignmentConfig,
    pub migration: MigrationConfig,
    pub session: SessionConfig,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Underlying symbol the runner analyses.
    pub symbol: String,
    /// JSON file holding recent snapshots.
    pub history_file: PathBuf,
    /// Snapshots kept in the history file.
    pub history_max: usize,
    pub analytics: AnalyticsConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut analytics = AnalyticsConfig::default();

        if let Some(window) = parse_var("CHAIN_MAGNET_WINDOW") {
            analytics.magnets.window = window;
        }
        if let Some(track_period) = parse_var::<usize>("CHAIN_TRACK_PERIOD") {
            analytics.migration.track_period = track_period.max(1);
        }
        if let Some(tolerance) = parse_var("CHAIN_STRIKE_TOLERANCE") {
            analytics.alignment.strike_tolerance = tolerance;
        }
        if let Some(step) = parse_var("CHAIN_STRIKE_STEP") {
            analytics.migration.strike_step = step;
        }

        let mut session = analytics.session.clone();
        if let Some(open) = time_var("SESSION_OPEN") {
            session.market_open = open;
        }
        if let Some(close) = time_var("SESSION_CLOSE") {
            session.market_close = close;
        }
        // An inverted session from the environment falls back to exchange hours
        if session.validate().is_ok() {
            analytics.session = session;
        } else {
            tracing::warn!(
                "Ignoring SESSION_OPEN/SESSION_CLOSE: {} - {} is not a valid session",
                session.market_open,
                session.market_close
            );
        }

        Self {
            symbol: env::var("CHAIN_SYMBOL").unwrap_or_else(|_| "NIFTY".to_string()),
            history_file: env::var("CHAIN_HISTORY_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output/chain_history.json")),
            history_max: parse_var("CHAIN_HISTORY_MAX").unwrap_or(40),
            analytics,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn time_var(key: &str) -> Option<NaiveTime> {
    env::var(key)
        .ok()
        .and_then(|v| NaiveTime::parse_from_str(v.trim(), "%H:%M").ok())
}

pub(crate) fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}
