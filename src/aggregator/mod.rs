//! Position aggregation: concurrent feed fetching under a retry policy,
//! cross-account merging, and the report pipeline.

mod merge;
mod report;
mod retry;
mod service;

pub use merge::group_by_category;
pub use report::build_report;
pub use retry::{Deadline, RetryPolicy};
pub use service::{PositionService, SnapshotFailure, SnapshotRange};
