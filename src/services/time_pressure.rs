//! Time-of-session pressure scoring.

use crate::config::{hm, SessionConfig};
use crate::types::{ChainSnapshot, PinningPressure, TimePhase, TimePressure};
use chrono::{NaiveDateTime, NaiveTime};
use tracing::debug;

/// Session fractions bounding the early, seller-comfort and late bands.
const EARLY_SESSION_END: f64 = 0.3;
const COMFORT_START: f64 = 0.4;
const COMFORT_END: f64 = 0.7;
const LATE_SESSION_START: f64 = 0.8;

#[derive(Debug, Clone, Default)]
pub struct TimePressureAnalyzer {
    config: SessionConfig,
}

impl TimePressureAnalyzer {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn analyze(&self, snapshot: &ChainSnapshot, at: NaiveDateTime) -> TimePressure {
        self.analyze_at(snapshot, at.time())
    }

    /// Score a snapshot against the wall-clock time of day.
    pub fn analyze_at(&self, snapshot: &ChainSnapshot, now: NaiveTime) -> TimePressure {
        let t = self.time_into_session(now);
        let time_phase = self.time_phase(now);
        debug!("Session {} at t={:.3}", time_phase, t);

        TimePressure {
            time_phase,
            time_into_session: t,
            seller_aggression: seller_aggression(t),
            pinning_pressure: self.pinning_pressure(snapshot, t),
            breakout_probability: breakout_probability(t),
            gamma_risk: self.gamma_risk(now),
        }
    }

    /// Elapsed share of the session in [0, 1].
    pub fn time_into_session(&self, now: NaiveTime) -> f64 {
        let length = self.config.length_seconds();
        if length <= 0 {
            return 0.0;
        }
        let elapsed = (now - self.config.market_open).num_seconds().max(0);
        (elapsed as f64 / length as f64).min(1.0)
    }

    pub fn time_phase(&self, now: NaiveTime) -> TimePhase {
        let open = self.config.market_open;
        let close = self.config.market_close;

        if now < open || now > close {
            TimePhase::Closed
        } else if now < hm(10, 30) {
            TimePhase::OpeningPhase
        } else if now < hm(11, 30) {
            TimePhase::MidMorning
        } else if now < hm(13, 30) {
            TimePhase::SellerComfortWindow
        } else if now < hm(14, 30) {
            TimePhase::PostLunch
        } else {
            TimePhase::GammaGamePhase
        }
    }

    /// High-OI strikes near spot that price tends to settle on late in the
    /// session.
    pub fn pinning_pressure(&self, snapshot: &ChainSnapshot, t: f64) -> PinningPressure {
        let cfg = &self.config;
        if t < cfg.pin_onset {
            return PinningPressure {
                pressure: cfg.base_pin_pressure,
                target_strikes: Vec::new(),
                strong_pin: false,
            };
        }

        let spot = snapshot.spot_price();
        let mut nearby: Vec<(f64, f64)> = snapshot
            .strikes()
            .iter()
            .filter(|q| (q.strike - spot).abs() < cfg.pin_distance)
            .filter(|q| q.total_oi() > cfg.pin_min_oi)
            .map(|q| (q.strike, (q.strike - spot).abs()))
            .collect();

        if nearby.is_empty() {
            return PinningPressure {
                pressure: cfg.untargeted_pin_pressure,
                target_strikes: Vec::new(),
                strong_pin: false,
            };
        }

        nearby.sort_by(|a, b| a.1.total_cmp(&b.1));
        let strong_pin = nearby.len() >= 2;
        let target_strikes = nearby
            .into_iter()
            .take(cfg.max_pin_targets)
            .map(|(strike, _)| strike)
            .collect();

        PinningPressure {
            pressure: (cfg.base_pin_pressure + (t - cfg.pin_onset) * 2.0)
                .min(cfg.max_pin_pressure),
            target_strikes,
            strong_pin,
        }
    }

    pub fn gamma_risk(&self, now: NaiveTime) -> f64 {
        match self.time_phase(now) {
            TimePhase::GammaGamePhase => 0.8,
            TimePhase::OpeningPhase => 0.7,
            _ => 0.4,
        }
    }
}

pub fn seller_aggression(t: f64) -> f64 {
    if (COMFORT_START..=COMFORT_END).contains(&t) {
        0.8
    } else if t > LATE_SESSION_START {
        0.9
    } else {
        0.5
    }
}

/// Likelihood a level break follows through. The [0.3, 0.4) and (0.7, 0.8]
/// bands have no opinion and score 0.5.
pub fn breakout_probability(t: f64) -> f64 {
    if t < EARLY_SESSION_END {
        0.8
    } else if (COMFORT_START..=COMFORT_END).contains(&t) {
        0.4
    } else if t > LATE_SESSION_START {
        0.6
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StrikeQuote;

    fn pin_chain(spot: f64) -> ChainSnapshot {
        ChainSnapshot::new(
            spot,
            vec![
                StrikeQuote::with_legs(19_950.0, 1_000_000, 0.15, 1_000_000, 0.15),
                StrikeQuote::with_legs(20_000.0, 400_000, 0.15, 500_000, 0.15),
                StrikeQuote::with_legs(20_050.0, 1_500_000, 0.15, 1_500_000, 0.15),
                StrikeQuote::with_legs(20_100.0, 2_500_000, 0.15, 2_500_000, 0.15),
                StrikeQuote::with_legs(20_150.0, 4_000_000, 0.15, 4_000_000, 0.15),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_phase_boundaries() {
        let analyzer = TimePressureAnalyzer::default();
        assert_eq!(analyzer.time_phase(hm(9, 0)), TimePhase::Closed);
        assert_eq!(analyzer.time_phase(hm(9, 15)), TimePhase::OpeningPhase);
        assert_eq!(analyzer.time_phase(hm(10, 30)), TimePhase::MidMorning);
        assert_eq!(analyzer.time_phase(hm(12, 0)), TimePhase::SellerComfortWindow);
        assert_eq!(analyzer.time_phase(hm(13, 30)), TimePhase::PostLunch);
        assert_eq!(analyzer.time_phase(hm(14, 30)), TimePhase::GammaGamePhase);
        assert_eq!(analyzer.time_phase(hm(15, 30)), TimePhase::GammaGamePhase);
        assert_eq!(analyzer.time_phase(hm(15, 31)), TimePhase::Closed);
    }

    #[test]
    fn test_time_into_session_clamped() {
        let analyzer = TimePressureAnalyzer::default();
        assert_eq!(analyzer.time_into_session(hm(8, 0)), 0.0);
        assert_eq!(analyzer.time_into_session(hm(16, 0)), 1.0);
        assert!((analyzer.time_into_session(hm(12, 0)) - 0.44).abs() < 1e-12);
    }

    #[test]
    fn test_comfort_window_scores() {
        let analyzer = TimePressureAnalyzer::default();
        let result = analyzer.analyze_at(&pin_chain(20_020.0), hm(12, 0));

        assert_eq!(result.time_phase, TimePhase::SellerComfortWindow);
        assert_eq!(result.seller_aggression, 0.8);
        assert_eq!(result.breakout_probability, 0.4);
        assert_eq!(result.gamma_risk, 0.4);
        assert_eq!(result.pinning_pressure.pressure, 0.3);
        assert!(result.pinning_pressure.target_strikes.is_empty());
    }

    #[test]
    fn test_late_session_pinning() {
        let analyzer = TimePressureAnalyzer::default();
        let result = analyzer.analyze_at(&pin_chain(20_020.0), hm(15, 0));

        assert!((result.time_into_session - 0.92).abs() < 1e-12);
        assert_eq!(result.time_phase, TimePhase::GammaGamePhase);
        assert_eq!(result.seller_aggression, 0.9);
        assert_eq!(result.breakout_probability, 0.6);
        assert_eq!(result.gamma_risk, 0.8);

        let pin = &result.pinning_pressure;
        assert!((pin.pressure - 0.54).abs() < 1e-9);
        // 20_150 is out of range, 20_000 is below the OI floor
        assert_eq!(pin.target_strikes, vec![20_050.0, 19_950.0, 20_100.0]);
        assert!(pin.strong_pin);
    }

    #[test]
    fn test_pressure_capped_at_close() {
        let analyzer = TimePressureAnalyzer::default();
        let pin = analyzer.pinning_pressure(&pin_chain(20_020.0), 1.0);
        assert!((pin.pressure - 0.7).abs() < 1e-9);

        let pin = analyzer.pinning_pressure(&pin_chain(20_020.0), 1.5);
        assert_eq!(pin.pressure, 0.9);
    }

    #[test]
    fn test_late_session_without_targets() {
        let analyzer = TimePressureAnalyzer::default();
        let pin = analyzer.pinning_pressure(&pin_chain(21_000.0), 0.9);
        assert_eq!(pin.pressure, 0.2);
        assert!(pin.target_strikes.is_empty());
        assert!(!pin.strong_pin);
    }

    #[test]
    fn test_breakout_gaps_fall_through() {
        assert_eq!(breakout_probability(0.1), 0.8);
        assert_eq!(breakout_probability(0.35), 0.5);
        assert_eq!(breakout_probability(0.75), 0.5);
        assert_eq!(breakout_probability(0.8), 0.5);
        assert_eq!(seller_aggression(0.75), 0.5);
    }

    #[test]
    fn test_pinning_pressures_follow_config() {
        let analyzer = TimePressureAnalyzer::new(SessionConfig {
            pin_onset: 0.5,
            base_pin_pressure: 0.1,
            untargeted_pin_pressure: 0.05,
            max_pin_pressure: 0.6,
            ..Default::default()
        });

        assert_eq!(analyzer.pinning_pressure(&pin_chain(20_020.0), 0.4).pressure, 0.1);
        let early_pin = analyzer.pinning_pressure(&pin_chain(20_020.0), 0.6);
        assert!((early_pin.pressure - 0.3).abs() < 1e-9);
        assert_eq!(early_pin.target_strikes.len(), 3);
        assert_eq!(analyzer.pinning_pressure(&pin_chain(20_020.0), 1.0).pressure, 0.6);
        assert_eq!(analyzer.pinning_pressure(&pin_chain(21_000.0), 0.9).pressure, 0.05);
        // Aggression and breakout bands are independent of the pin onset
        assert_eq!(seller_aggression(0.6), 0.8);
        assert_eq!(breakout_probability(0.75), 0.5);
    }
}
