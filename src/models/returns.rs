use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::CategoryBreakdown;

/// Return over one interval, in percent (10.0 means +10%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnByDate {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub return_pct: f64,
}

/// Interval return series for one asset (or one synthetic category asset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetReturn {
    pub asset_id: String,
    pub name: String,
    pub category: String,
    pub returns: Vec<ReturnByDate>,
}

/// The complete hand-off value for the rendering collaborator: the grouped
/// portfolio state plus every computed return series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnReport {
    pub breakdown: CategoryBreakdown,
    pub asset_returns: Vec<AssetReturn>,
    pub category_returns: Vec<AssetReturn>,
    /// Value-weighted portfolio return per interval.
    pub portfolio_returns: Vec<ReturnByDate>,
    /// Whole-period compounded portfolio return, in percent.
    pub compounded_pct: f64,
}
