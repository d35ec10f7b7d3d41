pub mod fxrates;
pub mod util;

pub use fxrates::FxRatesProvider;
