use super::util::with_retry;
use crate::core::config::FxRatesProviderConfig;
use crate::core::{CurrencyCatalog, CurrencyInfo, FetchError, RatesProvider, RatesSnapshot};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, instrument};

const RETRY_DELAY_MS: u64 = 500;

/// Client for fxratesapi-style "latest" and "currencies" endpoints.
pub struct FxRatesProvider {
    rates_url: String,
    currencies_url: String,
    retries: usize,
    client: reqwest::Client,
}

impl FxRatesProvider {
    pub fn new(config: &FxRatesProviderConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent("fxconv/0.1");
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(FxRatesProvider {
            rates_url: config.rates_url.clone(),
            currencies_url: config.currencies_url.clone(),
            retries: config.retries,
            client: builder.build()?,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let url_str = url.to_string();
        debug!("Requesting {}", url_str);

        let response = with_retry(
            || self.client.get(url.clone()).send(),
            self.retries,
            RETRY_DELAY_MS,
        )
        .await
        .map_err(|e| FetchError::Request {
            url: url_str.clone(),
            reason: error_chain(&e),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_str,
                status,
            });
        }

        let text = response.text().await.map_err(|e| FetchError::Request {
            url: url_str.clone(),
            reason: format!("Failed to read response body: {e}"),
        })?;

        serde_json::from_str(&text).map_err(|e| {
            error!(error = ?e, response = %text, "Failed to parse response");
            FetchError::decode(&url_str, e.to_string())
        })
    }
}

/// Flattens a reqwest error and its sources into one line.
fn error_chain(err: &reqwest::Error) -> String {
    let mut reason = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    reason
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    base: String,
    date: String,
    rates: HashMap<String, f64>,
}

impl LatestRatesResponse {
    fn into_snapshot(self, url: &str) -> Result<RatesSnapshot, FetchError> {
        if self.base.trim().is_empty() {
            return Err(FetchError::decode(url, "empty base currency"));
        }
        if let Some((code, rate)) = self
            .rates
            .iter()
            .find(|(_, rate)| !rate.is_finite() || **rate <= 0.0)
        {
            return Err(FetchError::decode(
                url,
                format!("invalid rate {rate} for {code}"),
            ));
        }

        Ok(RatesSnapshot {
            base: self.base,
            as_of: self.date,
            rates: self.rates,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CurrencyResponse {
    code: String,
    name: String,
    name_plural: String,
    symbol: String,
    symbol_native: String,
    decimal_digits: u32,
    rounding: f64,
}

fn into_catalog(
    url: &str,
    entries: HashMap<String, CurrencyResponse>,
) -> Result<CurrencyCatalog, FetchError> {
    entries
        .into_iter()
        .map(|(key, entry)| {
            if entry.code.is_empty() || entry.code != key {
                return Err(FetchError::decode(
                    url,
                    format!("currency entry {key} has code '{}'", entry.code),
                ));
            }
            Ok(CurrencyInfo {
                code: entry.code,
                name: entry.name,
                name_plural: entry.name_plural,
                symbol: entry.symbol,
                symbol_native: entry.symbol_native,
                decimal_digits: entry.decimal_digits,
                rounding: entry.rounding,
            })
        })
        .collect()
}

fn parse_url(url: &str, params: &[(&str, &str)]) -> Result<Url, FetchError> {
    let mut parsed = Url::parse(url).map_err(|e| FetchError::Request {
        url: url.to_string(),
        reason: format!("Invalid URL: {e}"),
    })?;
    if !params.is_empty() {
        parsed.query_pairs_mut().extend_pairs(params);
    }
    Ok(parsed)
}

#[async_trait]
impl RatesProvider for FxRatesProvider {
    #[instrument(name = "LatestRatesFetch", skip(self), fields(base = %base))]
    async fn fetch_latest_rates(&self, base: &str) -> Result<RatesSnapshot, FetchError> {
        let url = parse_url(&self.rates_url, &[("base", base)])?;
        let url_str = url.to_string();
        let response: LatestRatesResponse = self.get_json(url).await?;
        let snapshot = response.into_snapshot(&url_str)?;
        debug!(
            base = %snapshot.base,
            as_of = %snapshot.as_of,
            count = snapshot.rates.len(),
            "Fetched latest rates"
        );
        Ok(snapshot)
    }

    #[instrument(name = "CurrencyCatalogFetch", skip(self))]
    async fn fetch_currency_catalog(&self) -> Result<CurrencyCatalog, FetchError> {
        let url = parse_url(&self.currencies_url, &[])?;
        let url_str = url.to_string();
        let entries: HashMap<String, CurrencyResponse> = self.get_json(url).await?;
        let catalog = into_catalog(&url_str, entries)?;
        debug!(count = catalog.len(), "Fetched currency catalog");
        Ok(catalog)
    }
}
