use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Asset;

/// Resolved upstream account identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRef {
    pub id: String,
    pub name: String,
    /// Holder's document number, when the feed exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_document: Option<String>,
}

/// One account's position over one period: assets keyed by feed identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountPosition {
    pub assets: BTreeMap<String, Asset>,
}

impl AccountPosition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an asset, replacing any existing one with the same id.
    pub fn insert(&mut self, asset: Asset) {
        self.assets.insert(asset.id.clone(), asset);
    }

    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Asset> {
        self.assets.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Merge another position for the same account into this one.
    ///
    /// Holdings are keyed by requested date: an incoming holding for a date
    /// already present replaces that entry, so merging the same snapshot
    /// twice never duplicates rows. Transactions are appended.
    pub fn merge(&mut self, other: AccountPosition) {
        for (id, incoming) in other.assets {
            match self.assets.entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(incoming);
                }
                Entry::Occupied(mut slot) => {
                    let asset = slot.get_mut();
                    for holding in incoming.holdings {
                        match asset
                            .holdings
                            .iter_mut()
                            .find(|h| h.requested == holding.requested)
                        {
                            Some(existing) => *existing = holding,
                            None => asset.holdings.push(holding),
                        }
                    }
                    asset.transactions.extend(incoming.transactions);
                }
            }
        }
    }

    /// Extend matching assets' transaction lists from a secondary feed.
    ///
    /// Assets absent from this position are not surfaced; their ids are
    /// returned so the caller can log the omission.
    pub fn extend_transactions(&mut self, other: AccountPosition) -> Vec<String> {
        let mut dropped = Vec::new();
        for (id, incoming) in other.assets {
            match self.assets.get_mut(&id) {
                Some(asset) => asset.transactions.extend(incoming.transactions),
                None => dropped.push(id),
            }
        }
        dropped
    }

    /// Sort every asset's holdings ascending by requested date.
    pub fn sort_holdings(&mut self) {
        for asset in self.assets.values_mut() {
            asset.sort_holdings();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{event_time, Holding, Transaction};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn holding(requested: NaiveDate, value: rust_decimal::Decimal) -> Holding {
        Holding {
            currency: "BRL".to_string(),
            currency_sign: "R$".to_string(),
            value,
            units: dec!(10),
            requested,
            reported: Some(requested),
        }
    }

    fn transaction(value: rust_decimal::Decimal, occurred: NaiveDate) -> Transaction {
        Transaction {
            currency: "BRL".to_string(),
            currency_sign: "R$".to_string(),
            value,
            units: dec!(0),
            occurred: event_time(occurred),
        }
    }

    fn position_with(asset: Asset) -> AccountPosition {
        let mut position = AccountPosition::new();
        position.insert(asset);
        position
    }

    #[test]
    fn merge_is_idempotent_for_same_date_holdings() {
        let asset = Asset::new("PETR4", "stock", "Petrobras PN", "Stocks")
            .with_holding(holding(day(1), dec!(1000)));
        let mut merged = position_with(asset.clone());

        merged.merge(position_with(asset));

        let holdings = &merged.get("PETR4").unwrap().holdings;
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].value, dec!(1000));
    }

    #[test]
    fn merge_replaces_same_date_holding_and_keeps_new_dates() {
        let mut merged = position_with(
            Asset::new("PETR4", "stock", "Petrobras PN", "Stocks")
                .with_holding(holding(day(1), dec!(1000))),
        );

        merged.merge(position_with(
            Asset::new("PETR4", "stock", "Petrobras PN", "Stocks")
                .with_holding(holding(day(1), dec!(1050)))
                .with_holding(holding(day(2), dec!(1100))),
        ));

        let holdings = &merged.get("PETR4").unwrap().holdings;
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings.iter().find(|h| h.requested == day(1)).unwrap().value, dec!(1050));
        assert_eq!(holdings.iter().find(|h| h.requested == day(2)).unwrap().value, dec!(1100));
    }

    #[test]
    fn extend_transactions_drops_assets_missing_from_snapshot() {
        let mut snapshot = position_with(
            Asset::new("PETR4", "stock", "Petrobras PN", "Stocks")
                .with_holding(holding(day(1), dec!(1000))),
        );

        let mut secondary = AccountPosition::new();
        secondary.insert(
            Asset::new("PETR4", "stock", "Petrobras PN", "Stocks")
                .with_transaction(transaction(dec!(-50), day(2))),
        );
        secondary.insert(
            Asset::new("GHOST11", "fund", "Unsnapshotted fund", "Funds")
                .with_transaction(transaction(dec!(-10), day(2))),
        );

        let dropped = snapshot.extend_transactions(secondary);

        assert_eq!(dropped, vec!["GHOST11".to_string()]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("PETR4").unwrap().transactions.len(), 1);
    }
}
