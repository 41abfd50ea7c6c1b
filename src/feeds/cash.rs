use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::categories::CategoryMap;
use crate::error::Result;
use crate::models::{event_time, AccountPosition, Asset, Transaction};

use super::parse_feed_date;

const FEED: &str = "cash-movements";

/// Marker for in-kind transfers of an instrument out of the account.
pub const INSTRUMENT_WITHDRAWAL_MARKER: &str = "INSTRUMENT WITHDRAWAL";
/// Marker for yield credited to the cash account by an instrument.
pub const YIELD_MARKER: &str = "YIELD PAYMENT";
/// Marker for trade proceeds settling through the cash account.
pub const TRADE_SETTLEMENT_MARKER: &str = "TRADE SETTLEMENT";
/// Classification key shared by all yield and trade-settlement movements.
pub const YIELD_TRADE_CATEGORY_KEY: &str = "Yield / trade settlements";

/// Raw movement from the consolidated cash-account feed.
#[derive(Debug, Clone, Deserialize)]
pub struct CashRecord {
    #[serde(default, rename = "assetId")]
    pub asset_id: String,
    pub description: String,
    pub currency: String,
    #[serde(rename = "currencySign")]
    pub currency_sign: String,
    /// Signed from the instrument's perspective: value leaving an
    /// instrument (withdrawals, paid-out yield) is negative.
    pub value: Decimal,
    pub units: Decimal,
    #[serde(default, rename = "movementDate")]
    pub movement_date: String,
}

/// Convert cash-account movements into per-asset transactions.
///
/// The cash feed mixes everything the account does, so only two shapes are
/// kept: instrument withdrawals (negative units plus the withdrawal marker)
/// and yield or trade-settlement credits. Everything else is dropped before
/// any date is parsed. Values are already stated from the asset's
/// perspective, so no sign flip happens here.
pub fn parse_cash_movements(
    records: Vec<CashRecord>,
    categories: &CategoryMap,
) -> Result<AccountPosition> {
    let mut position = AccountPosition::new();
    let mut dropped = 0usize;

    for record in records {
        let withdrawal = record.units < Decimal::ZERO
            && record.description.contains(INSTRUMENT_WITHDRAWAL_MARKER);
        let yield_or_trade = record.description.contains(YIELD_MARKER)
            || record.description.contains(TRADE_SETTLEMENT_MARKER);
        if !withdrawal && !yield_or_trade {
            dropped += 1;
            continue;
        }

        let moved = parse_feed_date(&record.movement_date, FEED)?;
        let transaction = Transaction {
            currency: record.currency,
            currency_sign: record.currency_sign,
            value: record.value,
            units: record.units,
            occurred: moved.and_then(event_time),
        };

        match position.get_mut(&record.asset_id) {
            Some(asset) => asset.transactions.push(transaction),
            None => {
                let key = if withdrawal {
                    format!("{} / {}", record.movement_date.trim(), record.asset_id)
                } else {
                    YIELD_TRADE_CATEGORY_KEY.to_string()
                };
                let category = categories.classify(&key).to_string();
                let asset = Asset::new(record.asset_id, "", record.description, category)
                    .with_transaction(transaction);
                position.insert(asset);
            }
        }
    }

    if dropped > 0 {
        debug!(dropped, "ignored cash movements outside the two kept shapes");
    }
    Ok(position)
}
