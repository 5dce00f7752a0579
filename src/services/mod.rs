pub mod alignment;
pub mod buildup;
pub mod engine;
pub mod history;
pub mod levels;
pub mod magnets;
pub mod migration;
pub mod skew;
pub mod stats;
pub mod time_pressure;

pub use alignment::AlignmentAnalyzer;
pub use buildup::{classify_buildup, find_buildup_signals};
pub use engine::ChainEngine;
pub use history::{JsonHistoryStore, SnapshotHistory, MAX_HISTORY};
pub use levels::LevelDetector;
pub use magnets::{nearest_magnet, spot_in_gap, MagnetGapDetector};
pub use migration::{max_oi_record, MigrationHistory, MigrationTracker, TrackerRegistry};
pub use skew::SkewAnalyzer;
pub use time_pressure::TimePressureAnalyzer;
