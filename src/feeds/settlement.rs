use rust_decimal::Decimal;
use serde::Deserialize;

use crate::categories::CategoryMap;
use crate::error::Result;
use crate::models::{event_time, AccountPosition, Asset, Transaction};

use super::{leading_asset_id, parse_feed_date};

const FEED: &str = "settlements";

/// Raw row from the settlement ledger feed.
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementRecord {
    /// Composite description, `"<assetId> - <issuer text>"`.
    pub description: String,
    pub currency: String,
    #[serde(rename = "currencySign")]
    pub currency_sign: String,
    /// Signed from the cash account's perspective: purchases negative
    /// (cash leaving the account), sales positive.
    pub value: Decimal,
    pub units: Decimal,
    #[serde(default, rename = "settledDate")]
    pub settled_date: String,
}

/// Convert settlement ledger entries into per-asset transactions.
///
/// The ledger reports flows from the cash account's side, so `value` is
/// negated to express the flow into or out of the asset. Settlement days are
/// normalized to one instant late in the reporting zone's evening so that a
/// round-trip through UTC lands back on the same calendar day.
pub fn parse_settlements(
    records: Vec<SettlementRecord>,
    categories: &CategoryMap,
) -> Result<AccountPosition> {
    let mut position = AccountPosition::new();
    for record in records {
        let settled = parse_feed_date(&record.settled_date, FEED)?;
        let asset_id = leading_asset_id(&record.description).to_string();

        let transaction = Transaction {
            currency: record.currency,
            currency_sign: record.currency_sign,
            value: -record.value,
            units: record.units,
            occurred: settled.and_then(event_time),
        };

        match position.get_mut(&asset_id) {
            Some(asset) => asset.transactions.push(transaction),
            None => {
                let key = format!("{} / {}", record.description, asset_id);
                let category = categories.classify(&key).to_string();
                let asset = Asset::new(asset_id, "", record.description, category)
                    .with_transaction(transaction);
                position.insert(asset);
            }
        }
    }
    Ok(position)
}
