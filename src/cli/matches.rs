use super::ui;
use crate::core::catalog::{CatalogProvider, QuoteProvider};
use crate::core::error::RefreshError;
use crate::core::holdings::HoldingsProvider;
use crate::core::refresh::refresh_valuation;
use crate::core::valuation::ReconcileSettings;
use anyhow::Result;
use comfy_table::Cell;

/// Shows how each symbol resolved against the catalog, for tuning the
/// exclusion patterns when a ticker binds to the wrong entry.
pub async fn run(
    holdings: &dyn HoldingsProvider,
    catalog: &dyn CatalogProvider,
    quotes: &dyn QuoteProvider,
    settings: &ReconcileSettings,
) -> Result<()> {
    let pb = ui::new_progress_bar(3, true);
    pb.set_message("Resolving symbols...");

    let report =
        match refresh_valuation(holdings, catalog, quotes, settings, &|| pb.inc(1)).await {
            Ok(report) => report,
            Err(RefreshError::NotFound) => {
                pb.finish_and_clear();
                println!(
                    "{}",
                    ui::style_text(
                        "No trade history recorded for this key yet. Sync an exchange first.",
                        ui::StyleType::Subtle
                    )
                );
                return Ok(());
            }
            Err(e) => {
                pb.finish_and_clear();
                return Err(e.into());
            }
        };
    pb.finish_and_clear();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Catalog id"),
        ui::header_cell("Name"),
        ui::header_cell("Price"),
        ui::header_cell("24h %"),
        ui::header_cell("Market cap"),
    ]);

    for symbol in &report.symbols {
        match report.matches.get(symbol) {
            Some(matched) => {
                table.add_row(vec![
                    Cell::new(symbol),
                    Cell::new(&matched.entry.id),
                    matched.entry.name.as_ref().map_or(ui::na_cell(false), Cell::new),
                    ui::format_optional_cell(Some(matched.usd_price), ui::format_amount),
                    matched.change_24h.map_or(ui::na_cell(false), ui::change_cell),
                    ui::format_optional_cell(
                        (matched.market_cap > 0.0).then_some(matched.market_cap),
                        ui::compact_amount,
                    ),
                ]);
            }
            None => {
                table.add_row(vec![
                    Cell::new(symbol),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(true),
                ]);
            }
        }
    }

    println!("{table}");

    if let Some(degraded) = &report.degraded {
        println!(
            "{}",
            ui::style_text(
                &format!("Pricing degraded this cycle: {degraded}"),
                ui::StyleType::Error
            )
        );
    }

    Ok(())
}
