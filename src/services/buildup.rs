//! Futures build-up classification from end-of-day OI and price changes.

use crate::types::{Buildup, BuildupSignal, FuturesRow};
use std::collections::HashMap;
use tracing::debug;

/// Classify joint OI and price movement. Any zero change is neutral.
pub fn classify_buildup(oi_change: f64, price_change: f64) -> Buildup {
    if oi_change > 0.0 && price_change > 0.0 {
        Buildup::LongBuildup
    } else if oi_change > 0.0 && price_change < 0.0 {
        Buildup::ShortBuildup
    } else if oi_change < 0.0 && price_change > 0.0 {
        Buildup::ShortCovering
    } else if oi_change < 0.0 && price_change < 0.0 {
        Buildup::LongUnwinding
    } else {
        Buildup::Neutral
    }
}

/// Net build-up per futures symbol, in first-appearance order. Non-futures
/// rows and neutral symbols are dropped.
pub fn find_buildup_signals(rows: &[FuturesRow]) -> Vec<BuildupSignal> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, (f64, f64)> = HashMap::new();

    for row in rows.iter().filter(|r| r.instrument.is_future()) {
        let entry = totals.entry(row.symbol.as_str()).or_insert_with(|| {
            order.push(row.symbol.as_str());
            (0.0, 0.0)
        });
        entry.0 += row.oi_change;
        entry.1 += row.price_change;
    }

    let signals: Vec<BuildupSignal> = order
        .into_iter()
        .filter_map(|symbol| {
            let (oi_change, price_change) = totals.get(symbol).copied()?;
            match classify_buildup(oi_change, price_change) {
                Buildup::Neutral => None,
                signal => Some(BuildupSignal {
                    symbol: symbol.to_string(),
                    signal,
                    oi_change,
                    price_change,
                }),
            }
        })
        .collect();

    debug!("{} futures symbols with a build-up signal", signals.len());
    signals
}
