//! Consumer-side state for a converter session.
//!
//! Rates and the currency catalog live in separate watch channels. Each fetch
//! only ever writes its own slot and replaces the whole value, so a failure
//! of one fetch leaves the other untouched. Once every handle to the state is
//! dropped, late fetch results are discarded instead of applied.

use super::convert::{Conversion, ConversionRequest, evaluate};
use super::currency::{CurrencyCatalog, RatesProvider, RatesSnapshot};
use super::error::FetchError;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error};

/// Shown in pickers until the rates snapshot arrives.
pub const COMMON_CURRENCIES: [&str; 7] = ["USD", "EUR", "INR", "GBP", "JPY", "AUD", "CAD"];

/// Progress of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus<T> {
    Pending,
    Loaded(Arc<T>),
    Failed(FetchError),
}

impl<T> FetchStatus<T> {
    pub fn is_settled(&self) -> bool {
        !matches!(self, FetchStatus::Pending)
    }
}

/// A single fetched value plus the error of its latest attempt.
#[derive(Debug)]
struct Slot<T> {
    tx: watch::Sender<Option<Arc<T>>>,
    rx: watch::Receiver<Option<Arc<T>>>,
    status_tx: watch::Sender<FetchStatus<T>>,
    status_rx: watch::Receiver<FetchStatus<T>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        let (tx, rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(FetchStatus::Pending);
        Self {
            tx,
            rx,
            status_tx,
            status_rx,
        }
    }

    fn writer(&self) -> SlotWriter<T> {
        SlotWriter {
            tx: self.tx.clone(),
            status_tx: self.status_tx.clone(),
        }
    }

    fn current(&self) -> Option<Arc<T>> {
        self.rx.borrow().clone()
    }

    fn last_error(&self) -> Option<FetchError> {
        match &*self.status_rx.borrow() {
            FetchStatus::Failed(e) => Some(e.clone()),
            _ => None,
        }
    }
}

/// Held by a fetch task; applies results only while a reader is still alive.
struct SlotWriter<T> {
    tx: watch::Sender<Option<Arc<T>>>,
    status_tx: watch::Sender<FetchStatus<T>>,
}

impl<T> SlotWriter<T> {
    fn begin(&self) {
        self.status_tx.send_replace(FetchStatus::Pending);
    }

    fn apply(&self, name: &str, result: Result<T, FetchError>) {
        if self.tx.is_closed() {
            debug!(slot = name, "Consumer gone, discarding fetch result");
            return;
        }
        match result {
            Ok(value) => {
                let value = Arc::new(value);
                self.tx.send_replace(Some(Arc::clone(&value)));
                self.status_tx.send_replace(FetchStatus::Loaded(value));
            }
            Err(e) => {
                error!(slot = name, error = %e, "Fetch failed");
                self.status_tx.send_replace(FetchStatus::Failed(e));
            }
        }
    }
}

/// A label for a currency picker entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyOption {
    pub code: String,
    pub label: String,
}

/// Session state: the two fetched snapshots and the current request.
pub struct ConverterState {
    rates: Slot<RatesSnapshot>,
    catalog: Slot<CurrencyCatalog>,
    request: ConversionRequest,
}

impl ConverterState {
    pub fn new(request: ConversionRequest) -> Self {
        Self {
            rates: Slot::new(),
            catalog: Slot::new(),
            request,
        }
    }

    /// Starts both fetches concurrently and returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load(&self, provider: Arc<dyn RatesProvider>, base: &str) {
        let rates = self.rates.writer();
        let catalog = self.catalog.writer();
        rates.begin();
        catalog.begin();

        let rates_provider = Arc::clone(&provider);
        let base = base.to_string();
        tokio::spawn(async move {
            let result = rates_provider.fetch_latest_rates(&base).await;
            rates.apply("rates", result);
        });

        tokio::spawn(async move {
            let result = provider.fetch_currency_catalog().await;
            catalog.apply("catalog", result);
        });
    }

    /// Waits until neither fetch is pending. Never resolves if `load` was not called.
    pub async fn settled(&self) {
        let mut rates = self.rates.status_rx.clone();
        let mut catalog = self.catalog.status_rx.clone();
        // Both senders live in `self`, so wait_for cannot see a closed channel here.
        let rates_settled = async { rates.wait_for(FetchStatus::is_settled).await.is_ok() };
        let catalog_settled = async { catalog.wait_for(FetchStatus::is_settled).await.is_ok() };
        futures::future::join(rates_settled, catalog_settled).await;
    }

    pub fn is_loading(&self) -> bool {
        !self.rates.status_rx.borrow().is_settled()
    }

    pub fn rates(&self) -> Option<Arc<RatesSnapshot>> {
        self.rates.current()
    }

    pub fn catalog(&self) -> Option<Arc<CurrencyCatalog>> {
        self.catalog.current()
    }

    pub fn rates_error(&self) -> Option<FetchError> {
        self.rates.last_error()
    }

    pub fn catalog_error(&self) -> Option<FetchError> {
        self.catalog.last_error()
    }

    /// The one error to show the user, preferring the rates failure.
    pub fn error_message(&self) -> Option<String> {
        self.rates_error()
            .or_else(|| self.catalog_error())
            .map(|e| e.to_string())
    }

    pub fn request(&self) -> &ConversionRequest {
        &self.request
    }

    pub fn set_amount(&mut self, amount: f64) {
        self.request.amount = amount;
    }

    pub fn set_from(&mut self, code: &str) {
        self.request.from = code.trim().to_uppercase();
    }

    pub fn set_to(&mut self, code: &str) {
        self.request.to = code.trim().to_uppercase();
    }

    pub fn swap(&mut self) {
        self.request.swap();
    }

    pub fn conversion(&self) -> Conversion {
        evaluate(&self.request, self.rates().as_deref())
    }

    /// Picker entries: every code in the rates snapshot, or a common set
    /// until it arrives, labelled with catalog names where known.
    pub fn currency_options(&self) -> Vec<CurrencyOption> {
        let rates = self.rates();
        let codes: Vec<&str> = match rates.as_deref() {
            Some(snapshot) if !snapshot.rates.is_empty() => snapshot.codes(),
            _ => COMMON_CURRENCIES.to_vec(),
        };

        let catalog = self.catalog();
        codes
            .into_iter()
            .map(|code| {
                let label = match catalog.as_deref().and_then(|c| c.name(code)) {
                    Some(name) => format!("{code} — {name}"),
                    None => code.to_string(),
                };
                CurrencyOption {
                    code: code.to_string(),
                    label,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyInfo;
    use crate::core::error::ConvertError;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::Notify;

    struct MockProvider {
        rates: Result<RatesSnapshot, FetchError>,
        catalog: Result<CurrencyCatalog, FetchError>,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl RatesProvider for MockProvider {
        async fn fetch_latest_rates(&self, base: &str) -> Result<RatesSnapshot, FetchError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.rates.clone().map(|mut r| {
                r.base = base.to_string();
                r
            })
        }

        async fn fetch_currency_catalog(&self) -> Result<CurrencyCatalog, FetchError> {
            self.catalog.clone()
        }
    }

    fn snapshot() -> RatesSnapshot {
        RatesSnapshot {
            base: "USD".to_string(),
            as_of: "2025-08-01".to_string(),
            rates: HashMap::from([
                ("USD".to_string(), 1.0),
                ("EUR".to_string(), 0.92),
                ("INR".to_string(), 83.10),
            ]),
        }
    }

    fn catalog() -> CurrencyCatalog {
        [("EUR", "Euro"), ("INR", "Indian Rupee"), ("USD", "US Dollar")]
            .into_iter()
            .map(|(code, name)| CurrencyInfo {
                code: code.to_string(),
                name: name.to_string(),
                name_plural: format!("{name}s"),
                symbol: code.to_string(),
                symbol_native: code.to_string(),
                decimal_digits: 2,
                rounding: 0.0,
            })
            .collect()
    }

    fn server_error() -> FetchError {
        FetchError::Status {
            url: "http://localhost/latest?base=USD".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[test]
    fn test_not_ready_before_load() {
        let state = ConverterState::new(ConversionRequest::new(1.0, "USD", "INR"));
        assert_eq!(state.conversion(), Conversion::NotReady);
        assert!(state.error_message().is_none());
        let codes: Vec<_> = state.currency_options().into_iter().map(|o| o.code).collect();
        assert_eq!(codes, COMMON_CURRENCIES.to_vec());
    }

    #[test]
    fn test_same_currency_converts_before_load() {
        let mut state = ConverterState::new(ConversionRequest::new(50.0, "USD", "INR"));
        state.set_to("usd");
        assert_eq!(state.conversion(), Conversion::Ready(50.0));
        assert!(state.rates().is_none());
    }

    #[tokio::test]
    async fn test_load_populates_both_slots() {
        let provider = Arc::new(MockProvider {
            rates: Ok(snapshot()),
            catalog: Ok(catalog()),
            gate: None,
        });
        let mut state = ConverterState::new(ConversionRequest::new(100.0, "USD", "EUR"));
        state.load(provider, "USD");
        state.settled().await;

        assert!(!state.is_loading());
        assert!(state.error_message().is_none());
        assert_eq!(state.conversion().value(), Some(92.0));

        state.swap();
        state.set_amount(92.0);
        let back = state.conversion().value().unwrap();
        assert!((back - 100.0).abs() < 1e-9);

        let options = state.currency_options();
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].label, "EUR — Euro");
        assert_eq!(options[2].label, "USD — US Dollar");
    }

    #[tokio::test]
    async fn test_rates_failure_does_not_block_catalog() {
        let provider = Arc::new(MockProvider {
            rates: Err(server_error()),
            catalog: Ok(catalog()),
            gate: None,
        });
        let state = ConverterState::new(ConversionRequest::new(1.0, "USD", "INR"));
        state.load(provider, "USD");
        state.settled().await;

        assert_eq!(
            state.rates_error().and_then(|e| e.status()),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert!(state.error_message().unwrap().contains("500"));
        assert_eq!(state.conversion(), Conversion::NotReady);

        let catalog = state.catalog().expect("catalog should load independently");
        assert_eq!(catalog.name("INR"), Some("Indian Rupee"));

        let options = state.currency_options();
        let inr = options.iter().find(|o| o.code == "INR").unwrap();
        assert_eq!(inr.label, "INR — Indian Rupee");
        let gbp = options.iter().find(|o| o.code == "GBP").unwrap();
        assert_eq!(gbp.label, "GBP");
    }

    #[tokio::test]
    async fn test_catalog_failure_keeps_rates() {
        let provider = Arc::new(MockProvider {
            rates: Ok(snapshot()),
            catalog: Err(FetchError::Decode {
                url: "http://localhost/currencies".to_string(),
                reason: "expected a map".to_string(),
            }),
            gate: None,
        });
        let state = ConverterState::new(ConversionRequest::new(100.0, "EUR", "INR"));
        state.load(provider, "USD");
        state.settled().await;

        assert!(state.rates_error().is_none());
        assert!(state.error_message().unwrap().contains("expected a map"));
        let value = state.conversion().value().unwrap();
        assert!((value - 9032.61).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_unknown_code_is_invalid_not_error() {
        let provider = Arc::new(MockProvider {
            rates: Ok(snapshot()),
            catalog: Ok(catalog()),
            gate: None,
        });
        let mut state = ConverterState::new(ConversionRequest::new(10.0, "USD", "USD"));
        state.load(provider, "USD");
        state.settled().await;

        state.set_to("gbp");
        assert_eq!(
            state.conversion(),
            Conversion::Invalid(ConvertError::UnknownCurrency("GBP".to_string()))
        );
        assert!(state.error_message().is_none());
    }

    #[tokio::test]
    async fn test_loading_until_rates_arrive() {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(MockProvider {
            rates: Ok(snapshot()),
            catalog: Ok(catalog()),
            gate: Some(Arc::clone(&gate)),
        });
        let state = ConverterState::new(ConversionRequest::new(1.0, "USD", "EUR"));
        state.load(provider, "USD");

        assert!(state.is_loading());
        assert_eq!(state.conversion(), Conversion::NotReady);

        gate.notify_one();
        state.settled().await;
        assert!(!state.is_loading());
        assert!(state.rates().is_some());
    }

    #[test]
    fn test_writer_discards_when_no_reader() {
        let slot = Slot::<RatesSnapshot>::new();
        let writer = slot.writer();
        let observer = slot.tx.clone();
        drop(slot);

        writer.apply("rates", Ok(snapshot()));
        assert!(observer.borrow().is_none());
    }

    #[test]
    fn test_writer_replaces_whole_value() {
        let slot = Slot::<RatesSnapshot>::new();
        let writer = slot.writer();

        writer.apply("rates", Ok(snapshot()));
        let mut next = snapshot();
        next.rates.remove("INR");
        writer.apply("rates", Ok(next));

        let current = slot.current().unwrap();
        assert!(!current.rates.contains_key("INR"));
        assert!(slot.last_error().is_none());

        writer.apply("rates", Err(server_error()));
        assert!(slot.last_error().is_some());
        // A failed refresh keeps the last good snapshot
        assert!(slot.current().is_some());
    }

    #[tokio::test]
    async fn test_results_discarded_after_drop() {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(MockProvider {
            rates: Ok(snapshot()),
            catalog: Ok(catalog()),
            gate: Some(Arc::clone(&gate)),
        });
        let state = ConverterState::new(ConversionRequest::new(1.0, "USD", "EUR"));
        state.load(Arc::clone(&provider) as Arc<dyn RatesProvider>, "USD");
        drop(state);

        gate.notify_one();
        // Give the spawned task a chance to run to completion
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The task has finished and released its clone of the provider
        assert_eq!(Arc::strong_count(&provider), 1);
    }
}
