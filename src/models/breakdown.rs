use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Asset, Holding, Transaction};

/// Portfolio state grouped by business category.
///
/// Built from one or more account positions by
/// [`crate::aggregator::group_by_category`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// Collapsed assets grouped by category.
    pub assets_by_category: BTreeMap<String, Vec<Asset>>,
    /// Synthetic per-category asset: the category's holdings and
    /// transactions summed by date.
    pub category_assets: BTreeMap<String, Asset>,
    /// Total holding across all assets, per requested date.
    pub total_holdings_by_date: BTreeMap<NaiveDate, Holding>,
    /// Total transaction across all assets, per event day.
    pub total_transactions_by_date: BTreeMap<NaiveDate, Transaction>,
}

impl CategoryBreakdown {
    /// Total portfolio value at the given date: the exact entry when one
    /// exists, else the most recent entry before it.
    pub fn total_value_on_or_before(&self, date: NaiveDate) -> Option<Decimal> {
        self.total_holdings_by_date
            .range(..=date)
            .next_back()
            .map(|(_, h)| h.value)
    }
}
