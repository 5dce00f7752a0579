//! Chainsight - option-chain analytics for index and stock options

pub mod config;
pub mod error;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use config::{AnalyticsConfig, Config};
pub use error::{ChainError, Result};
pub use services::{ChainEngine, MigrationTracker, TrackerRegistry};
pub use types::*;
