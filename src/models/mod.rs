mod account;
mod asset;
mod breakdown;
mod returns;

pub use account::{AccountPosition, AccountRef};
pub use asset::{event_time, Asset, Holding, Transaction, REPORT_TZ};
pub use breakdown::CategoryBreakdown;
pub use returns::{AssetReturn, ReturnByDate, ReturnReport};
