use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::{Asset, Holding};

/// Dead-zone threshold, in currency units, under which a day's return is
/// defined as exactly 0%. Guards the division against near-zero bases; the
/// exact value is load-bearing for positions that dip to pennies.
pub const NEAR_ZERO_VALUE: f64 = 1.0;

/// Market return of one reconciliation day, in percent.
///
/// The day's window runs from `day` to the next calendar day. Cash flows
/// dated on the end day are netted out of the ending value so only market
/// movement remains.
pub(crate) fn day_return(asset: &Asset, day: NaiveDate) -> f64 {
    let Some(next) = day.succ_opt() else {
        return 0.0;
    };

    let start = holding_value(asset.holding_on(day));
    let end_holding = asset.holding_on(next);
    let end = holding_value(end_holding);
    let net_end = end - transaction_net(asset, next, end_holding);

    if start.abs() < NEAR_ZERO_VALUE || net_end.abs() < NEAR_ZERO_VALUE {
        return 0.0;
    }
    (net_end - start) / start * 100.0
}

fn holding_value(holding: Option<&Holding>) -> f64 {
    holding
        .map(|h| h.value.to_f64().unwrap_or_default())
        .unwrap_or_default()
}

/// Sum of the transaction values dated exactly on `day`.
///
/// A zero-value transaction that still moved units (an in-kind transfer) is
/// priced from the ending holding's unit price; without that holding or with
/// zero units it contributes nothing.
fn transaction_net(asset: &Asset, day: NaiveDate, end_holding: Option<&Holding>) -> f64 {
    let mut net = 0.0;
    for transaction in &asset.transactions {
        if transaction.occurred_day() != Some(day) {
            continue;
        }
        let value = transaction.value.to_f64().unwrap_or_default();
        if value != 0.0 {
            net += value;
        } else if transaction.units != Decimal::ZERO {
            if let Some(end) = end_holding {
                if end.units != Decimal::ZERO {
                    let unit_price = (end.value / end.units).to_f64().unwrap_or_default();
                    net += transaction.units.to_f64().unwrap_or_default() * unit_price;
                }
            }
        }
    }
    net
}
