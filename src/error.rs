//! Crate-wide error taxonomy.
//!
//! Callers branch on these variants (not-found vs ambiguous account lookups,
//! fatal date parses vs recoverable feed failures), so the aggregation and
//! return APIs return this typed error rather than an opaque one.

use reqwest::StatusCode;

/// Errors produced by feed parsing, position aggregation, and return
/// calculation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No upstream account matched the filter.
    #[error("no account matched filter {filter:?}")]
    AccountNotFound { filter: String },

    /// More than one upstream account matched the filter.
    #[error("filter {filter:?} matched {count} accounts; expected exactly one")]
    AmbiguousAccount { filter: String, count: usize },

    /// An upstream date field did not parse in the feed's fixed layout.
    ///
    /// Never downgraded to a default date: a bad date would land records in
    /// the wrong daily bucket and corrupt every aggregate built from them.
    #[error("feed {feed:?} reported unparseable date {value:?}")]
    DateFormat { feed: &'static str, value: String },

    /// An asset had fewer than two holdings, so no movement is computable.
    #[error("asset {asset_id:?} has {holdings} holding(s); at least 2 required")]
    InsufficientData { asset_id: String, holdings: usize },

    /// The upstream call failed at the transport layer.
    #[error("upstream request failed")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-success HTTP status.
    #[error("upstream request failed with status {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },

    /// The operation's deadline expired.
    #[error("{operation} exceeded its deadline")]
    Timeout { operation: String },

    /// Every retry attempt failed.
    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: String,
    },

    /// A concurrent fetch task was cancelled or panicked.
    #[error("background task for {operation} failed: {source}")]
    Task {
        operation: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
