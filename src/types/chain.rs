//! Option chain snapshot types.
//!
//! A [`ChainSnapshot`] is the unit of input for every analyzer. It is built
//! once per fetch cycle, validated on construction, and never mutated.

use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One leg (call or put) of a strike.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LegQuote {
    /// Outstanding contracts.
    pub open_interest: u64,
    /// Implied volatility; 0 means unknown/untraded.
    pub iv: f64,
}

impl LegQuote {
    pub fn new(open_interest: u64, iv: f64) -> Self {
        Self { open_interest, iv }
    }
}

/// Call and put legs quoted at a single strike.
#[derive(Debug, Clone, PartialEq)]
pub struct StrikeQuote {
    pub strike: f64,
    pub ce: Option<LegQuote>,
    pub pe: Option<LegQuote>,
}

impl StrikeQuote {
    pub fn new(strike: f64, ce: Option<LegQuote>, pe: Option<LegQuote>) -> Self {
        Self { strike, ce, pe }
    }

    /// Strike with both legs present.
    pub fn with_legs(strike: f64, ce_oi: u64, ce_iv: f64, pe_oi: u64, pe_iv: f64) -> Self {
        Self::new(
            strike,
            Some(LegQuote::new(ce_oi, ce_iv)),
            Some(LegQuote::new(pe_oi, pe_iv)),
        )
    }

    pub fn ce_oi(&self) -> u64 {
        self.ce.map(|l| l.open_interest).unwrap_or(0)
    }

    pub fn pe_oi(&self) -> u64 {
        self.pe.map(|l| l.open_interest).unwrap_or(0)
    }

    pub fn ce_iv(&self) -> f64 {
        self.ce.map(|l| l.iv).unwrap_or(0.0)
    }

    pub fn pe_iv(&self) -> f64 {
        self.pe.map(|l| l.iv).unwrap_or(0.0)
    }

    /// Combined call + put open interest, saturating at `u64::MAX`.
    pub fn total_oi(&self) -> u64 {
        self.ce_oi().saturating_add(self.pe_oi())
    }
}

/// Validated option chain for one expiry.
///
/// Strikes are sorted strictly ascending. A missing leg reads as zero open
/// interest and zero IV through the accessors on [`StrikeQuote`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChainSnapshot", into = "RawChainSnapshot")]
pub struct ChainSnapshot {
    spot_price: f64,
    strikes: Vec<StrikeQuote>,
}

impl ChainSnapshot {
    /// Build a snapshot, sorting strikes and rejecting contract violations.
    pub fn new(spot_price: f64, mut strikes: Vec<StrikeQuote>) -> Result<Self> {
        if !spot_price.is_finite() || spot_price < 0.0 {
            return Err(ChainError::InvalidSpot(spot_price));
        }

        for quote in &strikes {
            if !quote.strike.is_finite() {
                return Err(ChainError::InvalidStrike(quote.strike.to_string()));
            }
            for (leg, data) in [("CE", quote.ce), ("PE", quote.pe)] {
                if let Some(data) = data {
                    if !data.iv.is_finite() || data.iv < 0.0 {
                        return Err(ChainError::InvalidIv {
                            strike: quote.strike,
                            leg,
                            iv: data.iv,
                        });
                    }
                }
            }
        }

        strikes.sort_by(|a, b| a.strike.total_cmp(&b.strike));
        if let Some(dup) = strikes.windows(2).find(|w| w[0].strike == w[1].strike) {
            return Err(ChainError::DuplicateStrike(dup[0].strike));
        }

        Ok(Self { spot_price, strikes })
    }

    pub fn spot_price(&self) -> f64 {
        self.spot_price
    }

    /// All strikes in ascending order.
    pub fn strikes(&self) -> &[StrikeQuote] {
        &self.strikes
    }

    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    /// Index of an exact strike, if quoted.
    pub fn position(&self, strike: f64) -> Option<usize> {
        self.strikes.iter().position(|q| q.strike == strike)
    }

    /// Index of the strike nearest to spot. Ties go to the lower strike.
    pub fn atm_index(&self) -> Option<usize> {
        nearest_index(&self.strikes, self.spot_price)
    }

    /// The strike nearest to spot.
    pub fn atm_strike(&self) -> Option<f64> {
        self.atm_index().map(|i| self.strikes[i].strike)
    }

    pub fn total_oi(&self, index: usize) -> Option<u64> {
        self.strikes.get(index).map(StrikeQuote::total_oi)
    }

    /// Combined open interest per strike, aligned with [`Self::strikes`].
    pub fn total_oi_ladder(&self) -> Vec<f64> {
        self.strikes.iter().map(|q| q.total_oi() as f64).collect()
    }
}

/// First index minimising `|strike - target|`.
fn nearest_index(strikes: &[StrikeQuote], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, q) in strikes.iter().enumerate() {
        let distance = (q.strike - target).abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}

/// Wire form of a single leg as produced by the acquisition layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLeg {
    #[serde(default)]
    pub open_interest: i64,
    #[serde(rename = "IV", default)]
    pub iv: f64,
}

/// Wire form of a strike row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStrike {
    #[serde(rename = "CE", default, skip_serializing_if = "Option::is_none")]
    pub ce: Option<RawLeg>,
    #[serde(rename = "PE", default, skip_serializing_if = "Option::is_none")]
    pub pe: Option<RawLeg>,
}

/// Wire form of a chain: strike keys are strings, as they arrive in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChainSnapshot {
    pub spot_price: f64,
    pub chain: BTreeMap<String, RawStrike>,
}

fn leg_from_raw(strike: f64, leg: &'static str, raw: Option<RawLeg>) -> Result<Option<LegQuote>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.open_interest < 0 {
        return Err(ChainError::NegativeOpenInterest {
            strike,
            leg,
            oi: raw.open_interest,
        });
    }
    Ok(Some(LegQuote::new(raw.open_interest as u64, raw.iv)))
}

impl TryFrom<RawChainSnapshot> for ChainSnapshot {
    type Error = ChainError;

    fn try_from(raw: RawChainSnapshot) -> Result<Self> {
        let mut strikes = Vec::with_capacity(raw.chain.len());
        for (key, row) in raw.chain {
            let strike: f64 = key
                .trim()
                .parse()
                .map_err(|_| ChainError::InvalidStrike(key.clone()))?;
            strikes.push(StrikeQuote::new(
                strike,
                leg_from_raw(strike, "CE", row.ce)?,
                leg_from_raw(strike, "PE", row.pe)?,
            ));
        }
        ChainSnapshot::new(raw.spot_price, strikes)
    }
}

impl From<ChainSnapshot> for RawChainSnapshot {
    fn from(snapshot: ChainSnapshot) -> Self {
        let to_raw = |leg: Option<LegQuote>| {
            leg.map(|l| RawLeg {
                // The wire form is signed; clamp instead of wrapping negative
                open_interest: i64::try_from(l.open_interest).unwrap_or(i64::MAX),
                iv: l.iv,
            })
        };
        let chain = snapshot
            .strikes
            .into_iter()
            .map(|q| {
                (
                    q.strike.to_string(),
                    RawStrike {
                        ce: to_raw(q.ce),
                        pe: to_raw(q.pe),
                    },
                )
            })
            .collect();
        Self {
            spot_price: snapshot.spot_price,
            chain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_strikes() {
        let snap = ChainSnapshot::new(
            100.0,
            vec![
                StrikeQuote::with_legs(110.0, 1, 0.1, 1, 0.1),
                StrikeQuote::with_legs(90.0, 1, 0.1, 1, 0.1),
                StrikeQuote::with_legs(100.0, 1, 0.1, 1, 0.1),
            ],
        )
        .unwrap();

        let strikes: Vec<f64> = snap.strikes().iter().map(|q| q.strike).collect();
        assert_eq!(strikes, vec![90.0, 100.0, 110.0]);
    }

    #[test]
    fn test_duplicate_strike_rejected() {
        let result = ChainSnapshot::new(
            100.0,
            vec![
                StrikeQuote::with_legs(100.0, 1, 0.1, 1, 0.1),
                StrikeQuote::with_legs(100.0, 2, 0.2, 2, 0.2),
            ],
        );
        assert!(matches!(result, Err(ChainError::DuplicateStrike(_))));
    }

    #[test]
    fn test_missing_leg_reads_as_zero() {
        let quote = StrikeQuote::new(100.0, Some(LegQuote::new(500, 0.2)), None);
        assert_eq!(quote.pe_oi(), 0);
        assert_eq!(quote.pe_iv(), 0.0);
        assert_eq!(quote.total_oi(), 500);
    }

    #[test]
    fn test_atm_tie_prefers_lower_strike() {
        let snap = ChainSnapshot::new(
            125.0,
            vec![
                StrikeQuote::with_legs(100.0, 1, 0.1, 1, 0.1),
                StrikeQuote::with_legs(150.0, 1, 0.1, 1, 0.1),
            ],
        )
        .unwrap();
        assert_eq!(snap.atm_strike(), Some(100.0));
    }

    #[test]
    fn test_empty_snapshot_has_no_atm() {
        let snap = ChainSnapshot::new(100.0, vec![]).unwrap();
        assert!(snap.is_empty());
        assert_eq!(snap.atm_index(), None);
    }

    #[test]
    fn test_negative_spot_rejected() {
        assert!(matches!(
            ChainSnapshot::new(-1.0, vec![]),
            Err(ChainError::InvalidSpot(_))
        ));
    }

    #[test]
    fn test_huge_open_interest_saturates() {
        let snap = ChainSnapshot::new(
            100.0,
            vec![StrikeQuote::with_legs(100.0, u64::MAX, 0.1, 1, 0.1)],
        )
        .unwrap();
        assert_eq!(snap.strikes()[0].total_oi(), u64::MAX);
        assert_eq!(snap.total_oi(0), Some(u64::MAX));
    }

    #[test]
    fn test_huge_open_interest_reloads_clamped() {
        let snap = ChainSnapshot::new(
            100.0,
            vec![StrikeQuote::with_legs(100.0, u64::MAX, 0.1, 5, 0.1)],
        )
        .unwrap();

        let json = serde_json::to_string(&snap).unwrap();
        let back: ChainSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.strikes()[0].ce_oi(), i64::MAX as u64);
        assert_eq!(back.strikes()[0].pe_oi(), 5);
    }
}
