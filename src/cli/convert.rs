use super::ui::{self, StyleType};
use crate::core::{Conversion, ConversionRequest, ConverterState, CurrencyCatalog, RatesProvider};
use anyhow::{Result, anyhow};
use std::sync::Arc;
use tracing::debug;

fn currency_label(catalog: Option<&CurrencyCatalog>, code: &str) -> String {
    match catalog.and_then(|c| c.name(code)) {
        Some(name) => format!("{code} ({name})"),
        None => code.to_string(),
    }
}

/// Renders the error line, the conversion and the status line for `state`.
pub fn render(state: &ConverterState) -> String {
    let mut output = String::new();

    if let Some(message) = state.error_message() {
        output.push_str(&ui::style_text(&format!("Error: {message}"), StyleType::Error));
        output.push('\n');
    }

    let request = state.request();
    let catalog = state.catalog();
    let catalog = catalog.as_deref();

    let from_decimals = ui::decimals_for(catalog, &request.from).unwrap_or(2);
    let to_decimals = ui::decimals_for(catalog, &request.to).unwrap_or(ui::DEFAULT_DECIMALS);

    let converted = ui::conversion_text(&state.conversion(), to_decimals);
    let converted = if converted.is_empty() {
        ui::style_text("N/A", StyleType::Subtle)
    } else {
        ui::style_text(&converted, StyleType::TotalValue)
    };

    output.push_str(&format!(
        "{} {} = {} {}",
        ui::style_text(
            &ui::format_amount(request.amount, from_decimals),
            StyleType::TotalLabel
        ),
        currency_label(catalog, &request.from),
        converted,
        currency_label(catalog, &request.to),
    ));

    if state.is_loading() {
        output.push('\n');
        output.push_str(&ui::style_text("Fetching latest rates…", StyleType::Subtle));
    } else if let Some(rates) = state.rates() {
        let as_of = rates
            .as_of_date()
            .map_or_else(|| rates.as_of.clone(), |d| d.to_string());
        output.push('\n');
        output.push_str(&ui::style_text(
            &format!("Rates as of {as_of} (base {})", rates.base),
            StyleType::Subtle,
        ));
    }

    output
}

/// Fetches rates once, prints a single conversion and fails if no value could be computed.
pub async fn run(
    provider: Arc<dyn RatesProvider>,
    base: &str,
    request: ConversionRequest,
) -> Result<()> {
    let state = ConverterState::new(request);
    state.load(provider, base);

    let pb = ui::new_spinner("Fetching latest rates…");
    state.settled().await;
    pb.finish_and_clear();

    println!("{}", render(&state));

    match state.conversion() {
        Conversion::Ready(value) => {
            debug!(value, "Conversion complete");
            Ok(())
        }
        Conversion::NotReady => Err(state
            .rates_error()
            .map_or_else(|| anyhow!("Exchange rates are not available"), anyhow::Error::from)),
        Conversion::Invalid(e) => Err(e.into()),
    }
}
