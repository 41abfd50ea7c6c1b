use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::models::{AccountPosition, Asset, CategoryBreakdown, Transaction};

/// Collapse positions from several accounts into one portfolio view grouped
/// by business category.
///
/// Same-asset collisions across accounts sum holding values per requested
/// date (units keep the first account's entry) and sum transaction values
/// and units per event day. Undated transactions share a single undated
/// slot. The synthetic per-category asset and the grand totals apply the
/// same per-date summing; undated transactions stay out of the date-keyed
/// total map.
pub fn group_by_category(positions: Vec<AccountPosition>) -> CategoryBreakdown {
    let mut breakdown = CategoryBreakdown::default();

    for asset in collapse(positions).into_values() {
        for holding in &asset.holdings {
            match breakdown.total_holdings_by_date.entry(holding.requested) {
                Entry::Vacant(slot) => {
                    slot.insert(holding.clone());
                }
                Entry::Occupied(mut slot) => slot.get_mut().value += holding.value,
            }
        }
        for transaction in &asset.transactions {
            if let Some(day) = transaction.occurred_day() {
                match breakdown.total_transactions_by_date.entry(day) {
                    Entry::Vacant(slot) => {
                        slot.insert(transaction.clone());
                    }
                    Entry::Occupied(mut slot) => {
                        let total = slot.get_mut();
                        total.value += transaction.value;
                        total.units += transaction.units;
                    }
                }
            }
        }

        let category_asset = breakdown
            .category_assets
            .entry(asset.category.clone())
            .or_insert_with(|| {
                Asset::new(
                    asset.category.clone(),
                    "",
                    asset.category.clone(),
                    asset.category.clone(),
                )
            });
        add_into(category_asset, asset.clone());

        breakdown
            .assets_by_category
            .entry(asset.category.clone())
            .or_default()
            .push(asset);
    }

    for category_asset in breakdown.category_assets.values_mut() {
        category_asset.sort_holdings();
    }
    for assets in breakdown.assets_by_category.values_mut() {
        for asset in assets {
            asset.sort_holdings();
        }
    }
    breakdown
}

fn collapse(positions: Vec<AccountPosition>) -> BTreeMap<String, Asset> {
    let mut collapsed: BTreeMap<String, Asset> = BTreeMap::new();
    for position in positions {
        for (id, asset) in position.assets {
            match collapsed.entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(asset);
                }
                Entry::Occupied(mut slot) => add_into(slot.get_mut(), asset),
            }
        }
    }
    collapsed
}

fn add_into(target: &mut Asset, incoming: Asset) {
    for holding in incoming.holdings {
        match target
            .holdings
            .iter_mut()
            .find(|h| h.requested == holding.requested)
        {
            Some(existing) => existing.value += holding.value,
            None => target.holdings.push(holding),
        }
    }
    for transaction in incoming.transactions {
        add_transaction(target, transaction);
    }
}

fn add_transaction(target: &mut Asset, transaction: Transaction) {
    let day = transaction.occurred_day();
    match target
        .transactions
        .iter_mut()
        .find(|t| t.occurred_day() == day)
    {
        Some(existing) => {
            existing.value += transaction.value;
            existing.units += transaction.units;
        }
        None => target.transactions.push(transaction),
    }
}
