use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Asset, AssetReturn, CategoryBreakdown, ReturnByDate};

use super::intervals::collapse_days;

/// Interval return series for one asset.
///
/// Fails when the asset has fewer than two holdings: a single valuation has
/// no movement to measure.
pub fn asset_return(asset: &Asset, interval_days: u32) -> Result<Vec<ReturnByDate>> {
    let first = asset.holdings.iter().map(|h| h.requested).min();
    let last = asset.holdings.iter().map(|h| h.requested).max();
    let (Some(first), Some(last)) = (first, last) else {
        return Err(insufficient(asset));
    };
    if asset.holdings.len() < 2 {
        return Err(insufficient(asset));
    }
    Ok(collapse_days(asset, first, last, interval_days))
}

fn insufficient(asset: &Asset) -> Error {
    Error::InsufficientData {
        asset_id: asset.id.clone(),
        holdings: asset.holdings.len(),
    }
}

/// Return series for every asset in the iterator, skipping the ones with too
/// little data instead of failing the batch.
pub fn portfolio_asset_returns<'a>(
    assets: impl IntoIterator<Item = &'a Asset>,
    interval_days: u32,
) -> Vec<AssetReturn> {
    let mut results = Vec::new();
    for asset in assets {
        match asset_return(asset, interval_days) {
            Ok(returns) => results.push(AssetReturn {
                asset_id: asset.id.clone(),
                name: asset.name.clone(),
                category: asset.category.clone(),
                returns,
            }),
            Err(error) => debug!(asset = %asset.id, %error, "skipping asset in batch return calculation"),
        }
    }
    results
}

/// Value-weighted portfolio return per interval.
///
/// Each asset-interval return is weighted by the asset's share of the total
/// portfolio value at the interval's start (most recent holding on or before
/// that date; weight zero when the total is zero or negative). Weighted sums
/// are bucketed by interval end date and normalized by the accumulated
/// weight, except that a zero accumulated weight leaves the raw sum.
pub fn portfolio_return(
    breakdown: &CategoryBreakdown,
    asset_returns: &[AssetReturn],
) -> Vec<ReturnByDate> {
    struct Bucket {
        start: NaiveDate,
        weighted: f64,
        weight: f64,
    }

    let assets_by_id: HashMap<&str, &Asset> = breakdown
        .assets_by_category
        .values()
        .flatten()
        .map(|asset| (asset.id.as_str(), asset))
        .collect();

    let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
    for asset_return in asset_returns {
        let Some(asset) = assets_by_id.get(asset_return.asset_id.as_str()) else {
            continue;
        };
        for interval in &asset_return.returns {
            let start_value = asset
                .holding_on_or_before(interval.start)
                .map(|h| h.value.to_f64().unwrap_or_default())
                .unwrap_or_default();
            let total = breakdown
                .total_value_on_or_before(interval.start)
                .map(|v| v.to_f64().unwrap_or_default())
                .unwrap_or_default();
            let weight = if total > 0.0 { start_value / total } else { 0.0 };

            let bucket = buckets.entry(interval.end).or_insert(Bucket {
                start: interval.start,
                weighted: 0.0,
                weight: 0.0,
            });
            bucket.start = bucket.start.min(interval.start);
            bucket.weighted += weight * interval.return_pct;
            bucket.weight += weight;
        }
    }

    let mut series: Vec<ReturnByDate> = buckets
        .into_iter()
        .map(|(end, bucket)| ReturnByDate {
            start: bucket.start,
            end,
            return_pct: if bucket.weight == 0.0 {
                bucket.weighted
            } else {
                bucket.weighted / bucket.weight
            },
        })
        .collect();
    series.sort_by_key(|r| r.start);
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::group_by_category;
    use crate::models::{AccountPosition, Holding};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn holding(requested: NaiveDate, value: Decimal) -> Holding {
        Holding {
            currency: "BRL".to_string(),
            currency_sign: "R$".to_string(),
            value,
            units: dec!(1),
            requested,
            reported: None,
        }
    }

    fn breakdown_of(assets: Vec<Asset>) -> CategoryBreakdown {
        let mut position = AccountPosition::new();
        for asset in assets {
            position.insert(asset);
        }
        group_by_category(vec![position])
    }

    #[test]
    fn test_asset_return_requires_two_holdings() {
        let asset = Asset::new("PETR4", "stock", "Petrobras PN", "Stocks")
            .with_holding(holding(day(1), dec!(1000)));

        let err = asset_return(&asset, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientData { holdings: 1, .. }
        ));
    }

    #[test]
    fn test_batch_skips_thin_assets() {
        let thin = Asset::new("THIN3", "stock", "Thin Data SA", "Stocks")
            .with_holding(holding(day(1), dec!(100)));
        let full = Asset::new("PETR4", "stock", "Petrobras PN", "Stocks")
            .with_holding(holding(day(1), dec!(1000)))
            .with_holding(holding(day(2), dec!(1100)));

        let returns = portfolio_asset_returns([&thin, &full], 1);

        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].asset_id, "PETR4");
        assert!((returns[0].returns[0].return_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_asset_portfolio_matches_the_asset_series() {
        let asset = Asset::new("PETR4", "stock", "Petrobras PN", "Stocks")
            .with_holding(holding(day(1), dec!(1000)))
            .with_holding(holding(day(2), dec!(1100)))
            .with_holding(holding(day(3), dec!(1050)));

        let breakdown = breakdown_of(vec![asset]);
        let asset_returns =
            portfolio_asset_returns(breakdown.assets_by_category.values().flatten(), 1);
        let portfolio = portfolio_return(&breakdown, &asset_returns);

        assert_eq!(portfolio, asset_returns[0].returns);
    }

    #[test]
    fn test_portfolio_weights_by_start_value() {
        let growing = Asset::new("PETR4", "stock", "Petrobras PN", "Stocks")
            .with_holding(holding(day(1), dec!(1000)))
            .with_holding(holding(day(2), dec!(1100)));
        let flat = Asset::new("KDIF11", "fund", "Kinea Infra", "Funds")
            .with_holding(holding(day(1), dec!(3000)))
            .with_holding(holding(day(2), dec!(3000)));

        let breakdown = breakdown_of(vec![growing, flat]);
        let asset_returns =
            portfolio_asset_returns(breakdown.assets_by_category.values().flatten(), 1);
        let portfolio = portfolio_return(&breakdown, &asset_returns);

        // 25% of the portfolio returned 10%, 75% returned 0%.
        assert_eq!(portfolio.len(), 1);
        assert_eq!((portfolio[0].start, portfolio[0].end), (day(1), day(2)));
        assert!((portfolio[0].return_pct - 2.5).abs() < 1e-9);
    }
}
