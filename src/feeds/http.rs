use anyhow::Context;
use chrono::NaiveDate;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::AccountRef;

use super::{AccountRecord, BrokerageFeed, CashRecord, HoldingRecord, SettlementRecord, TradeRecord};

const BASE_URL: &str = "https://api.openbroker.com.br";
const QUERY_DATE_LAYOUT: &str = "%Y-%m-%d";

/// HTTP client for the brokerage's reporting API.
///
/// All endpoints are bearer-authenticated GETs. Response payloads keep the
/// upstream's own field layouts; they are parsed into the unified model by the
/// per-feed parsers, not here.
pub struct HttpBrokerageFeed {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl HttpBrokerageFeed {
    pub fn new(token: SecretString) -> Self {
        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
            token,
        }
    }

    /// Build a feed from configuration, reading the bearer token from the
    /// configured environment variable.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let env_var = &config.upstream.auth_token_env;
        let token = std::env::var(env_var)
            .with_context(|| format!("missing upstream auth token (set {})", env_var))?;
        let client = Client::builder()
            .timeout(config.upstream.request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        let mut feed = Self::new(SecretString::from(token)).with_client(client);
        if let Some(base_url) = &config.upstream.base_url {
            feed = feed.with_base_url(base_url.clone());
        }
        Ok(feed)
    }

    /// Override the API base URL (primarily for tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus { status, body });
        }
        Ok(response.json().await?)
    }
}

fn range_query(start: NaiveDate, end: NaiveDate) -> Vec<(&'static str, String)> {
    vec![
        ("start", start.format(QUERY_DATE_LAYOUT).to_string()),
        ("end", end.format(QUERY_DATE_LAYOUT).to_string()),
    ]
}

#[async_trait::async_trait]
impl BrokerageFeed for HttpBrokerageFeed {
    async fn search_accounts(&self, filter: &str) -> Result<Vec<AccountRecord>> {
        #[derive(Deserialize)]
        struct Response {
            accounts: Vec<AccountRecord>,
        }

        let response: Response = self
            .get("/accounts", &[("filter", filter.to_string())])
            .await?;
        Ok(response.accounts)
    }

    async fn holdings_snapshot(
        &self,
        account: &AccountRef,
        date: NaiveDate,
    ) -> Result<Vec<HoldingRecord>> {
        #[derive(Deserialize)]
        struct Response {
            holdings: Vec<HoldingRecord>,
        }

        let path = format!("/accounts/{}/holdings", account.id);
        let query = [("date", date.format(QUERY_DATE_LAYOUT).to_string())];
        let response: Response = self.get(&path, &query).await?;
        Ok(response.holdings)
    }

    async fn settlement_entries(
        &self,
        account: &AccountRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SettlementRecord>> {
        #[derive(Deserialize)]
        struct Response {
            entries: Vec<SettlementRecord>,
        }

        let path = format!("/accounts/{}/settlements", account.id);
        let response: Response = self.get(&path, &range_query(start, end)).await?;
        Ok(response.entries)
    }

    async fn trade_tickets(
        &self,
        account: &AccountRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TradeRecord>> {
        #[derive(Deserialize)]
        struct Response {
            tickets: Vec<TradeRecord>,
        }

        let path = format!("/accounts/{}/trades", account.id);
        let response: Response = self.get(&path, &range_query(start, end)).await?;
        Ok(response.tickets)
    }

    async fn cash_movements(
        &self,
        account: &AccountRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CashRecord>> {
        #[derive(Deserialize)]
        struct Response {
            movements: Vec<CashRecord>,
        }

        let path = format!("/accounts/{}/cash-movements", account.id);
        let response: Response = self.get(&path, &range_query(start, end)).await?;
        Ok(response.movements)
    }

    fn name(&self) -> &str {
        "openbroker"
    }
}
