use rust_decimal::Decimal;
use serde::Deserialize;

use crate::categories::CategoryMap;
use crate::error::Result;
use crate::models::{event_time, AccountPosition, Asset, Transaction};

use super::{leading_asset_id, parse_feed_date};

const FEED: &str = "trades";

/// Raw trade ticket from the trades feed.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeRecord {
    /// Composite description, `"<assetId> - <issuer text>"`.
    pub description: String,
    pub currency: String,
    #[serde(rename = "currencySign")]
    pub currency_sign: String,
    /// Signed from the cash account's perspective, like the settlement
    /// feed: buys negative, sells positive.
    pub value: Decimal,
    pub units: Decimal,
    #[serde(default, rename = "tradeDate")]
    pub trade_date: String,
}

/// Convert trade tickets into per-asset transactions.
///
/// Same sign and date conventions as the settlement ledger; the feeds differ
/// in coverage (tickets appear before their settlements) and in using the
/// whole raw description as the classification key.
pub fn parse_trades(records: Vec<TradeRecord>, categories: &CategoryMap) -> Result<AccountPosition> {
    let mut position = AccountPosition::new();
    for record in records {
        let traded = parse_feed_date(&record.trade_date, FEED)?;
        let asset_id = leading_asset_id(&record.description).to_string();

        let transaction = Transaction {
            currency: record.currency,
            currency_sign: record.currency_sign,
            value: -record.value,
            units: record.units,
            occurred: traded.and_then(event_time),
        };

        match position.get_mut(&asset_id) {
            Some(asset) => asset.transactions.push(transaction),
            None => {
                let category = categories.classify(&record.description).to_string();
                let asset = Asset::new(asset_id, "", record.description, category)
                    .with_transaction(transaction);
                position.insert(asset);
            }
        }
    }
    Ok(position)
}
