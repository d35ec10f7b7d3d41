//! Core business logic abstractions

pub mod config;
pub mod convert;
pub mod currency;
pub mod error;
pub mod log;
pub mod state;

// Re-export main types for cleaner imports
pub use convert::{Conversion, ConversionRequest, convert_amount, evaluate};
pub use currency::{CurrencyCatalog, CurrencyInfo, RatesProvider, RatesSnapshot};
pub use error::{ConvertError, FetchError};
pub use state::{ConverterState, CurrencyOption};
