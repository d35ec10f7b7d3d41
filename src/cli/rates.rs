use super::ui::{self, StyleType};
use crate::core::{ConversionRequest, ConverterState, CurrencyCatalog, RatesProvider, RatesSnapshot};
use anyhow::Result;
use comfy_table::Cell;
use std::sync::Arc;

/// Renders every rate in the snapshot, with names when the catalog is available.
pub fn render_rates_table(snapshot: &RatesSnapshot, catalog: Option<&CurrencyCatalog>) -> String {
    let base = &snapshot.base;
    let mut table = ui::new_styled_table();

    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Per 1 {base}")),
        ui::header_cell(&format!("{base} per unit")),
    ]);

    for code in snapshot.codes() {
        let name = catalog.and_then(|c| c.name(code)).unwrap_or("");
        let rate = snapshot.rate(code);
        let inverse = snapshot.convert(1.0, code, base).ok();

        table.add_row(vec![
            Cell::new(code),
            Cell::new(name),
            ui::format_optional_cell(rate, |r| ui::format_amount(r, 4)),
            ui::format_optional_cell(inverse, |r| ui::format_amount(r, 6)),
        ]);
    }

    let as_of = snapshot
        .as_of_date()
        .map_or_else(|| snapshot.as_of.clone(), |d| d.to_string());

    format!(
        "Exchange rates for {}\n\n{}\n\n{}",
        ui::style_text(&format!("1 {base}"), StyleType::Title),
        table,
        ui::style_text(&format!("As of {as_of}"), StyleType::Subtle),
    )
}

pub async fn run(provider: Arc<dyn RatesProvider>, base: &str) -> Result<()> {
    let state = ConverterState::new(ConversionRequest::new(1.0, base, base));
    state.load(provider, base);

    let pb = ui::new_spinner("Fetching latest rates…");
    state.settled().await;
    pb.finish_and_clear();

    if let Some(e) = state.catalog_error() {
        eprintln!(
            "{}",
            ui::style_text(&format!("Currency names unavailable: {e}"), StyleType::Error)
        );
    }

    match state.rates() {
        Some(snapshot) => {
            println!("{}", render_rates_table(&snapshot, state.catalog().as_deref()));
            Ok(())
        }
        None => Err(state
            .rates_error()
            .map_or_else(|| anyhow::anyhow!("Exchange rates are not available"), anyhow::Error::from)),
    }
}
