use chrono::NaiveDate;
use tracing::info;

use crate::error::Result;
use crate::models::ReturnReport;
use crate::returns::{compound_returns, portfolio_asset_returns, portfolio_return};

use super::merge::group_by_category;
use super::retry::Deadline;
use super::service::PositionService;

/// Build the complete return report for a set of account filters.
///
/// This is the whole pipeline in one call: resolve each filter to exactly one
/// account, fetch full positions, group them by category, then run the return
/// engine per asset, per category, and portfolio-wide.
pub async fn build_report(
    service: &PositionService,
    filters: &[String],
    start: NaiveDate,
    end: NaiveDate,
    interval_days: u32,
    deadline: Option<Deadline>,
) -> Result<ReturnReport> {
    let mut accounts = Vec::with_capacity(filters.len());
    for filter in filters {
        accounts.push(service.find_account(filter, deadline).await?);
    }

    let positions = service
        .fetch_accounts(&accounts, start, end, interval_days, deadline)
        .await?;
    let breakdown = group_by_category(positions);

    let asset_returns =
        portfolio_asset_returns(breakdown.assets_by_category.values().flatten(), interval_days);
    let category_returns = portfolio_asset_returns(breakdown.category_assets.values(), interval_days);
    let portfolio_returns = portfolio_return(&breakdown, &asset_returns);
    let compounded_pct = compound_returns(&portfolio_returns);

    info!(
        accounts = accounts.len(),
        assets = asset_returns.len(),
        intervals = portfolio_returns.len(),
        "report built"
    );

    Ok(ReturnReport {
        breakdown,
        asset_returns,
        category_returns,
        portfolio_returns,
        compounded_pct,
    })
}
