use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::categories::CategoryMap;
use crate::error::{Error, Result};
use crate::feeds::{
    parse_cash_movements, parse_holdings, parse_settlements, parse_trades, BrokerageFeed,
};
use crate::models::{AccountPosition, AccountRef};

use super::retry::{retry, Deadline, RetryPolicy};

/// One snapshot date that still failed after every retry.
#[derive(Debug)]
pub struct SnapshotFailure {
    pub date: NaiveDate,
    pub error: Error,
}

/// Outcome of a snapshot-range fetch: whatever merged cleanly plus the dated
/// failures. Partial data with failures is the `Ok` shape; `Err` is reserved
/// for task join failures.
#[derive(Debug)]
pub struct SnapshotRange {
    pub position: AccountPosition,
    pub failures: Vec<SnapshotFailure>,
}

/// Fetches, parses, and merges upstream feed data into account positions.
#[derive(Clone)]
pub struct PositionService {
    feed: Arc<dyn BrokerageFeed>,
    categories: Arc<CategoryMap>,
    retry: RetryPolicy,
}

impl PositionService {
    pub fn new(feed: Arc<dyn BrokerageFeed>, categories: CategoryMap, retry: RetryPolicy) -> Self {
        Self {
            feed,
            categories: Arc::new(categories),
            retry,
        }
    }

    /// Resolve a free-text filter to exactly one account.
    pub async fn find_account(
        &self,
        filter: &str,
        deadline: Option<Deadline>,
    ) -> Result<AccountRef> {
        let feed = self.feed.as_ref();
        let mut matches = retry(self.retry, deadline, "account search", move || async move {
            feed.search_accounts(filter).await
        })
        .await?;

        match matches.len() {
            0 => Err(Error::AccountNotFound {
                filter: filter.to_string(),
            }),
            1 => Ok(matches.remove(0).into()),
            count => Err(Error::AmbiguousAccount {
                filter: filter.to_string(),
                count,
            }),
        }
    }

    /// Fetch holdings snapshots for every date in `[start, end]` stepped by
    /// `interval_days`, one concurrent task per date.
    ///
    /// A date that exhausts its retries becomes an entry in
    /// [`SnapshotRange::failures`] without disturbing the other dates.
    pub async fn fetch_snapshot_range(
        &self,
        account: &AccountRef,
        start: NaiveDate,
        end: NaiveDate,
        interval_days: u32,
        deadline: Option<Deadline>,
    ) -> Result<SnapshotRange> {
        let step = u64::from(interval_days.max(1));
        let mut tasks = JoinSet::new();

        let mut next = Some(start);
        while let Some(date) = next {
            if date > end {
                break;
            }
            let policy = self.retry;
            let feed = Arc::clone(&self.feed);
            let categories = Arc::clone(&self.categories);
            let account = account.clone();
            tasks.spawn(async move {
                let feed = feed.as_ref();
                let categories = categories.as_ref();
                let account = &account;
                let result = retry(policy, deadline, "holdings snapshot", move || async move {
                    let records = feed.holdings_snapshot(account, date).await?;
                    parse_holdings(records, date, categories)
                })
                .await;
                (date, result)
            });
            next = date.checked_add_days(Days::new(step));
        }

        let mut position = AccountPosition::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (date, result) = joined.map_err(|source| Error::Task {
                operation: "holdings snapshot",
                source,
            })?;
            match result {
                Ok(snapshot) => position.merge(snapshot),
                Err(error) => failures.push(SnapshotFailure { date, error }),
            }
        }

        failures.sort_by_key(|failure| failure.date);
        position.sort_holdings();
        Ok(SnapshotRange { position, failures })
    }

    /// Fetch an account's complete position: the snapshot range plus the
    /// three transaction feeds, all four in flight at once.
    ///
    /// Snapshot failures are fatal. A transaction feed that exhausts its
    /// retries is logged and omitted; its absence skews no holding, only the
    /// cash-flow netting for its assets.
    pub async fn fetch_full_position(
        &self,
        account: &AccountRef,
        start: NaiveDate,
        end: NaiveDate,
        interval_days: u32,
        deadline: Option<Deadline>,
    ) -> Result<AccountPosition> {
        debug!(account = %account.id, %start, %end, "fetching full position");

        let snapshot_task = {
            let service = self.clone();
            let account = account.clone();
            tokio::spawn(async move {
                service
                    .fetch_snapshot_range(&account, start, end, interval_days, deadline)
                    .await
            })
        };
        let settlement_task = {
            let service = self.clone();
            let account = account.clone();
            tokio::spawn(async move {
                let feed = service.feed.as_ref();
                let categories = service.categories.as_ref();
                let account = &account;
                retry(
                    service.retry,
                    deadline,
                    "settlement entries",
                    move || async move {
                        let records = feed.settlement_entries(account, start, end).await?;
                        parse_settlements(records, categories)
                    },
                )
                .await
            })
        };
        let trade_task = {
            let service = self.clone();
            let account = account.clone();
            tokio::spawn(async move {
                let feed = service.feed.as_ref();
                let categories = service.categories.as_ref();
                let account = &account;
                retry(service.retry, deadline, "trade tickets", move || async move {
                    let records = feed.trade_tickets(account, start, end).await?;
                    parse_trades(records, categories)
                })
                .await
            })
        };
        let cash_task = {
            let service = self.clone();
            let account = account.clone();
            tokio::spawn(async move {
                let feed = service.feed.as_ref();
                let categories = service.categories.as_ref();
                let account = &account;
                retry(service.retry, deadline, "cash movements", move || async move {
                    let records = feed.cash_movements(account, start, end).await?;
                    parse_cash_movements(records, categories)
                })
                .await
            })
        };

        // Join barrier: every task finishes before any outcome is
        // interpreted.
        let snapshots = snapshot_task.await;
        let settlements = settlement_task.await;
        let trades = trade_task.await;
        let cash = cash_task.await;

        let range = match snapshots {
            Ok(result) => result?,
            Err(source) => {
                return Err(Error::Task {
                    operation: "holdings snapshot",
                    source,
                })
            }
        };
        let SnapshotRange {
            mut position,
            failures,
        } = range;
        if !failures.is_empty() {
            for failure in &failures {
                error!(date = %failure.date, error = %failure.error, "snapshot date failed after retries");
            }
            if let Some(failure) = failures.into_iter().next() {
                return Err(failure.error);
            }
        }

        let mut transactions = AccountPosition::new();
        for (feed_name, joined) in [
            ("settlement entries", settlements),
            ("trade tickets", trades),
            ("cash movements", cash),
        ] {
            match joined {
                Ok(Ok(secondary)) => transactions.merge(secondary),
                Ok(Err(error)) => {
                    warn!(feed = feed_name, %error, "transaction feed omitted after retries");
                }
                Err(source) => {
                    return Err(Error::Task {
                        operation: feed_name,
                        source,
                    })
                }
            }
        }

        let dropped = position.extend_transactions(transactions);
        if !dropped.is_empty() {
            debug!(assets = ?dropped, "dropped transactions for assets never snapshotted");
        }
        Ok(position)
    }

    /// Fetch full positions for several accounts, one after another. The
    /// first failing account aborts the rest.
    pub async fn fetch_accounts(
        &self,
        accounts: &[AccountRef],
        start: NaiveDate,
        end: NaiveDate,
        interval_days: u32,
        deadline: Option<Deadline>,
    ) -> Result<Vec<AccountPosition>> {
        let mut positions = Vec::with_capacity(accounts.len());
        for account in accounts {
            positions.push(
                self.fetch_full_position(account, start, end, interval_days, deadline)
                    .await?,
            );
        }
        Ok(positions)
    }
}
