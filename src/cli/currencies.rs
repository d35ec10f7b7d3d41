use super::ui;
use crate::core::{CurrencyCatalog, RatesProvider};
use anyhow::Result;
use comfy_table::Cell;
use std::sync::Arc;
use tracing::info;

pub fn render_catalog_table(catalog: &CurrencyCatalog) -> String {
    let mut table = ui::new_styled_table();

    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Plural"),
        ui::header_cell("Symbol"),
        ui::header_cell("Native"),
        ui::header_cell("Decimals"),
    ]);

    for info in catalog.iter() {
        table.add_row(vec![
            Cell::new(&info.code),
            Cell::new(&info.name),
            Cell::new(&info.name_plural),
            Cell::new(&info.symbol),
            Cell::new(&info.symbol_native),
            ui::number_cell(info.decimal_digits.to_string()),
        ]);
    }

    table.to_string()
}

/// Only the catalog endpoint is needed here, so rates are never requested.
pub async fn run(provider: Arc<dyn RatesProvider>) -> Result<()> {
    let pb = ui::new_spinner("Fetching currencies…");
    let result = provider.fetch_currency_catalog().await;
    pb.finish_and_clear();

    let catalog = result?;
    info!(count = catalog.len(), "Listing currencies");
    println!("{}", render_catalog_table(&catalog));
    Ok(())
}
