use chrono::{Days, NaiveDate};

use crate::models::{Asset, ReturnByDate};

use super::daily::day_return;

/// Collapse an asset's daily returns over `[first, last]` into intervals of
/// `interval_days`.
///
/// Reconciliation always steps one calendar day at a time regardless of the
/// interval. When the running day reaches the current interval's boundary the
/// interval is emitted and that day's return seeds the next compound. The
/// trailing partial interval is always emitted, so consecutive entries share
/// endpoints and the series covers the whole span.
pub(crate) fn collapse_days(
    asset: &Asset,
    first: NaiveDate,
    last: NaiveDate,
    interval_days: u32,
) -> Vec<ReturnByDate> {
    let step = u64::from(interval_days.max(1));
    let mut returns = Vec::new();
    let mut interval_start = first;
    let mut compound = 1.0_f64;

    let mut next = Some(first);
    while let Some(day) = next {
        if day >= last {
            break;
        }
        let daily = day_return(asset, day);
        let due = interval_start
            .checked_add_days(Days::new(step))
            .is_some_and(|boundary| day >= boundary);
        if due {
            returns.push(ReturnByDate {
                start: interval_start,
                end: day,
                return_pct: (compound - 1.0) * 100.0,
            });
            interval_start = day;
            compound = 1.0 + daily / 100.0;
        } else {
            compound *= 1.0 + daily / 100.0;
        }
        next = day.succ_opt();
    }

    returns.push(ReturnByDate {
        start: interval_start,
        end: last,
        return_pct: (compound - 1.0) * 100.0,
    });
    returns
}

/// Compound a return series into one whole-period percentage.
pub fn compound_returns(returns: &[ReturnByDate]) -> f64 {
    let product: f64 = returns
        .iter()
        .map(|r| 1.0 + r.return_pct / 100.0)
        .product();
    (product - 1.0) * 100.0
}
