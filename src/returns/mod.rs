//! Time-weighted return calculation over built positions.
//!
//! Stateless pipeline: daily reconciliation with cash-flow netting, geometric
//! collapsing into caller-chosen intervals, then value-weighted aggregation
//! across the portfolio.

mod daily;
mod intervals;
mod portfolio;

pub use daily::NEAR_ZERO_VALUE;
pub use intervals::compound_returns;
pub use portfolio::{asset_return, portfolio_asset_returns, portfolio_return};
