//! Exchange rate and currency metadata abstractions

use super::error::{ConvertError, FetchError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Exchange rates relative to a single base currency, as returned by the provider.
///
/// Each rate is the number of units of that currency per one unit of `base`.
/// The base itself may or may not be present in `rates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesSnapshot {
    pub base: String,
    pub as_of: String,
    pub rates: HashMap<String, f64>,
}

impl RatesSnapshot {
    /// Rate for `code`, with the base implied to be 1 when the provider omits it.
    pub fn rate(&self, code: &str) -> Option<f64> {
        match self.rates.get(code) {
            Some(rate) => Some(*rate),
            None if code == self.base => Some(1.0),
            None => None,
        }
    }

    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, ConvertError> {
        super::convert::convert_with(amount, from, to, |code| self.rate(code))
    }

    /// Currency codes with a rate, sorted.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.rates.keys().map(String::as_str).collect();
        if !self.rates.contains_key(&self.base) {
            codes.push(&self.base);
        }
        codes.sort_unstable();
        codes
    }

    /// Provider date, which is either an RFC 3339 timestamp or a plain date.
    pub fn as_of_date(&self) -> Option<NaiveDate> {
        DateTime::parse_from_rfc3339(&self.as_of)
            .map(|dt| dt.with_timezone(&Utc).date_naive())
            .ok()
            .or_else(|| NaiveDate::parse_from_str(&self.as_of, "%Y-%m-%d").ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    pub code: String,
    pub name: String,
    pub name_plural: String,
    pub symbol: String,
    pub symbol_native: String,
    pub decimal_digits: u32,
    pub rounding: f64,
}

/// Currency metadata keyed by code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyCatalog {
    entries: BTreeMap<String, CurrencyInfo>,
}

impl CurrencyCatalog {
    pub fn new(entries: BTreeMap<String, CurrencyInfo>) -> Self {
        Self { entries }
    }

    pub fn get(&self, code: &str) -> Option<&CurrencyInfo> {
        self.entries.get(code)
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.get(code).map(|info| info.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurrencyInfo> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CurrencyInfo> for CurrencyCatalog {
    fn from_iter<I: IntoIterator<Item = CurrencyInfo>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|info| (info.code.clone(), info))
                .collect(),
        )
    }
}

#[async_trait]
pub trait RatesProvider: Send + Sync {
    async fn fetch_latest_rates(&self, base: &str) -> Result<RatesSnapshot, FetchError>;

    async fn fetch_currency_catalog(&self) -> Result<CurrencyCatalog, FetchError>;
}
