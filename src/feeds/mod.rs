//! Upstream brokerage feed boundary.
//!
//! [`BrokerageFeed`] is the collaborator contract for the four record feeds
//! plus account search; [`HttpBrokerageFeed`] is the production client. Each
//! feed module owns its raw record shape and the parser that converts those
//! records into the unified asset model.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::AccountRef;

mod cash;
mod holdings;
mod http;
mod settlement;
mod trades;

pub use cash::{
    parse_cash_movements, CashRecord, INSTRUMENT_WITHDRAWAL_MARKER, TRADE_SETTLEMENT_MARKER,
    YIELD_MARKER, YIELD_TRADE_CATEGORY_KEY,
};
pub use holdings::{parse_holdings, HoldingRecord};
pub use http::HttpBrokerageFeed;
pub use settlement::{parse_settlements, SettlementRecord};
pub use trades::{parse_trades, TradeRecord};

/// Fixed slash-delimited layout used by every feed's date fields.
pub const DATE_LAYOUT: &str = "%d/%m/%Y";

/// Raw account record from the account search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "holderDocument")]
    pub holder_document: Option<String>,
}

impl From<AccountRecord> for AccountRef {
    fn from(record: AccountRecord) -> Self {
        AccountRef {
            id: record.id,
            name: record.name,
            holder_document: record.holder_document,
        }
    }
}

/// Upstream feed client consumed by the position aggregator.
///
/// Methods return the feeds' raw records; parsing into the asset model is a
/// separate step so each parser stays independently testable. The retry loop
/// inspects errors only for "did it succeed", never per status code.
#[async_trait::async_trait]
pub trait BrokerageFeed: Send + Sync {
    /// Accounts matching a free-text filter.
    async fn search_accounts(&self, filter: &str) -> Result<Vec<AccountRecord>>;

    /// Point-in-time holdings snapshot for one date.
    async fn holdings_snapshot(
        &self,
        account: &AccountRef,
        date: NaiveDate,
    ) -> Result<Vec<HoldingRecord>>;

    /// Settlement ledger entries within a date range.
    async fn settlement_entries(
        &self,
        account: &AccountRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SettlementRecord>>;

    /// Trade tickets within a date range.
    async fn trade_tickets(
        &self,
        account: &AccountRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TradeRecord>>;

    /// Consolidated cash-account movements within a date range.
    async fn cash_movements(
        &self,
        account: &AccountRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CashRecord>>;

    fn name(&self) -> &str;
}

/// Parse a feed date field in the fixed slash layout.
///
/// An empty field means the feed omitted the date. A malformed one is fatal:
/// defaulting it would land records in the wrong daily bucket.
pub(crate) fn parse_feed_date(value: &str, feed: &'static str) -> Result<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_LAYOUT)
        .map(Some)
        .map_err(|_| Error::DateFormat {
            feed,
            value: value.to_string(),
        })
}

/// Asset identifier embedded at the front of a composite description,
/// e.g. `"PETR4 - PETROBRAS PN"`.
pub(crate) fn leading_asset_id(description: &str) -> &str {
    description.split(" - ").next().unwrap_or(description).trim()
}
