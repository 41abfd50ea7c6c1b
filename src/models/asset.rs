use chrono::{DateTime, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed time zone in which the upstream feeds report event days.
pub const REPORT_TZ: Tz = chrono_tz::America::Sao_Paulo;

/// One tradable instrument position tracked over time.
///
/// Owned exclusively by whichever timeline currently holds it; merging builds
/// new `Asset` values rather than mutating shared ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Feed-assigned identifier, unique within one portfolio snapshot.
    pub id: String,
    /// Upstream instrument type, free-form.
    pub instrument: String,
    /// Display name.
    pub name: String,
    /// Business category assigned by the classifier.
    pub category: String,
    /// Valuation snapshots; ascending by requested date after merge.
    #[serde(default)]
    pub holdings: Vec<Holding>,
    /// Cash-flow events affecting this asset.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        instrument: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            instrument: instrument.into(),
            name: name.into(),
            category: category.into(),
            holdings: Vec::new(),
            transactions: Vec::new(),
        }
    }

    pub fn with_holding(mut self, holding: Holding) -> Self {
        self.holdings.push(holding);
        self
    }

    pub fn with_transaction(mut self, transaction: Transaction) -> Self {
        self.transactions.push(transaction);
        self
    }

    /// Holding snapshotted for exactly the given requested date.
    pub fn holding_on(&self, date: NaiveDate) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.requested == date)
    }

    /// Holding for the given date, else the most recent one before it.
    pub fn holding_on_or_before(&self, date: NaiveDate) -> Option<&Holding> {
        self.holdings
            .iter()
            .filter(|h| h.requested <= date)
            .max_by_key(|h| h.requested)
    }

    /// Sort holdings ascending by requested date.
    pub fn sort_holdings(&mut self) {
        self.holdings.sort_by_key(|h| h.requested);
    }
}

/// A point-in-time valuation of an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub currency: String,
    pub currency_sign: String,
    pub value: Decimal,
    pub units: Decimal,
    /// The date the snapshot was requested for.
    pub requested: NaiveDate,
    /// The date the feed itself reported, when it differs or is present.
    pub reported: Option<NaiveDate>,
}

/// A cash-flow event affecting an asset.
///
/// Values are signed from the asset's perspective once parsed: flows into
/// the position are positive, flows out are negative. Return netting
/// subtracts them from the ending value to isolate market movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub currency: String,
    pub currency_sign: String,
    pub value: Decimal,
    pub units: Decimal,
    /// Event time: 23:00 on the reported day in [`REPORT_TZ`], stored UTC.
    pub occurred: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Calendar day of the event in the reporting time zone.
    pub fn occurred_day(&self) -> Option<NaiveDate> {
        self.occurred
            .map(|t| t.with_timezone(&REPORT_TZ).date_naive())
    }
}

/// Fix an event day to 23:00 in the reporting time zone, as UTC.
///
/// All transaction feeds report whole days; pinning them late in the local
/// day keeps every event inside the calendar day the upstream printed.
pub fn event_time(day: NaiveDate) -> Option<DateTime<Utc>> {
    let local = day.and_hms_opt(23, 0, 0)?;
    match REPORT_TZ.from_local_datetime(&local) {
        LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
