use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::categories::CategoryMap;
use crate::error::Result;
use crate::models::{AccountPosition, Asset, Holding};

use super::parse_feed_date;

const FEED: &str = "holdings";

/// Raw row from the holdings snapshot feed.
#[derive(Debug, Clone, Deserialize)]
pub struct HoldingRecord {
    #[serde(rename = "assetId")]
    pub asset_id: String,
    pub description: String,
    pub instrument: String,
    pub currency: String,
    #[serde(rename = "currencySign")]
    pub currency_sign: String,
    pub value: Decimal,
    pub units: Decimal,
    /// Valuation date as stated by upstream, `""` when it only knows the
    /// requested date.
    #[serde(default, rename = "reportedDate")]
    pub reported_date: String,
}

/// Convert one snapshot's rows into per-asset holdings dated `requested`.
///
/// Classification keys are `"<assetId> - <description>"`. A repeated asset id
/// within the same snapshot is an additional custody lot; its value and units
/// are added into the asset's holding for the date.
pub fn parse_holdings(
    records: Vec<HoldingRecord>,
    requested: NaiveDate,
    categories: &CategoryMap,
) -> Result<AccountPosition> {
    let mut position = AccountPosition::new();
    for record in records {
        let reported = parse_feed_date(&record.reported_date, FEED)?;

        if let Some(asset) = position.get_mut(&record.asset_id) {
            match asset.holdings.iter_mut().find(|h| h.requested == requested) {
                Some(holding) => {
                    holding.value += record.value;
                    holding.units += record.units;
                }
                None => asset.holdings.push(Holding {
                    currency: record.currency,
                    currency_sign: record.currency_sign,
                    value: record.value,
                    units: record.units,
                    requested,
                    reported,
                }),
            }
            continue;
        }

        let key = format!("{} - {}", record.asset_id, record.description);
        let category = categories.classify(&key).to_string();
        let asset = Asset::new(
            record.asset_id,
            record.instrument,
            record.description,
            category,
        )
        .with_holding(Holding {
            currency: record.currency,
            currency_sign: record.currency_sign,
            value: record.value,
            units: record.units,
            requested,
            reported,
        });
        position.insert(asset);
    }
    Ok(position)
}
