use super::ui;
use crate::core::catalog::{CatalogProvider, QuoteProvider};
use crate::core::error::RefreshError;
use crate::core::holdings::HoldingsProvider;
use crate::core::refresh::{ValuationReport, refresh_valuation};
use crate::core::valuation::ReconcileSettings;
use anyhow::Result;
use comfy_table::Cell;

impl ValuationReport {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Symbol"),
            ui::header_cell("Balance"),
            ui::header_cell("Price"),
            ui::header_cell("24h %"),
            ui::header_cell("Avg Buy"),
            ui::header_cell("Avg Sell"),
            ui::header_cell("Dif %"),
            ui::header_cell("Value"),
            ui::header_cell("Profit"),
            ui::header_cell("Fees"),
            ui::header_cell("Distr"),
        ]);

        for record in &self.records {
            table.add_row(vec![
                Cell::new(&record.symbol),
                ui::format_optional_cell(Some(record.balance), ui::format_amount),
                ui::format_optional_cell(record.current_price, ui::format_amount),
                record.change_24h.map_or(ui::na_cell(false), ui::change_cell),
                ui::format_optional_cell(record.average_buy, ui::format_amount),
                ui::format_optional_cell(record.average_sell, ui::format_amount),
                record
                    .percent_differential
                    .map_or(ui::na_cell(false), ui::change_cell),
                ui::format_optional_cell(record.market_value, ui::format_amount),
                ui::format_optional_cell(record.profit, ui::format_amount),
                ui::format_optional_cell(record.total_fees, ui::format_amount),
                ui::format_optional_cell(record.distribution_value, ui::format_amount),
            ]);
        }

        table.to_string()
    }
}

fn total_line(label: &str, value: f64, style_type: ui::StyleType) -> String {
    format!(
        "{} {}",
        ui::style_text(&format!("{label}:"), ui::StyleType::TotalLabel),
        ui::style_text(&format!("{value:.2}"), style_type),
    )
}

pub async fn run(
    holdings: &dyn HoldingsProvider,
    catalog: &dyn CatalogProvider,
    quotes: &dyn QuoteProvider,
    settings: &ReconcileSettings,
) -> Result<()> {
    let pb = ui::new_progress_bar(3, true);
    pb.set_message("Reconciling holdings...");

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

    if report.records.is_empty() {
        println!(
            "{}",
            ui::style_text("No assets in the latest snapshot.", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    println!("{}", report.display_as_table());

    // Portfolio totals over the rows where the figure is defined.
    let cost: f64 = report.records.iter().filter_map(|r| r.cost).sum();
    let revenue: f64 = report.records.iter().filter_map(|r| r.revenue).sum();
    let fees: f64 = report.records.iter().filter_map(|r| r.total_fees).sum();
    let value: f64 = report.records.iter().filter_map(|r| r.market_value).sum();
    let profit: f64 = report.records.iter().filter_map(|r| r.profit).sum();
    let distributions: f64 = report
        .records
        .iter()
        .filter_map(|r| r.distribution_value)
        .sum();

    println!();
    println!("{}", total_line("Cost (USD)", cost, ui::StyleType::TotalValue));
    println!(
        "{}",
        total_line("Revenue (USD)", revenue, ui::StyleType::TotalValue)
    );
    println!("{}", total_line("Fees (USD)", fees, ui::StyleType::TotalValue));
    println!(
        "{}",
        total_line("Distributions (USD)", distributions, ui::StyleType::TotalValue)
    );
    println!(
        "{}",
        total_line("Market value (USD)", value, ui::StyleType::TotalValue)
    );
    let profit_style = if profit >= 0.0 {
        ui::StyleType::TotalValue
    } else {
        ui::StyleType::Error
    };
    println!("{}", total_line("Profit (USD)", profit, profit_style));

    // Anything that kept a row from being fully priced.
    let notes: Vec<String> = report
        .records
        .iter()
        .filter_map(|r| r.note.as_ref().map(|note| format!("{}: {note}", r.symbol)))
        .collect();
    if !notes.is_empty() {
        println!();
        for note in notes {
            println!("{}", ui::style_text(&note, ui::StyleType::Subtle));
        }
    }

    let unmatched: Vec<&str> = report
        .symbols
        .iter()
        .filter(|symbol| {
            !report.matches.contains_key(*symbol) && !settings.usd_equivalents.contains(*symbol)
        })
        .map(String::as_str)
        .collect();
    if !unmatched.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("Unmatched symbols: {}", unmatched.join(", ")),
                ui::StyleType::Subtle
            )
        );
    }

    if let Some(degraded) = &report.degraded {
        println!(
            "{}",
            ui::style_text(
                &format!("Pricing degraded this cycle: {degraded}"),
                ui::StyleType::Error
            )
        );
    }
    if report.refreshing {
        println!(
            "{}",
            ui::style_text(
                "The ledger is still syncing trade history; figures may be incomplete.",
                ui::StyleType::Subtle
            )
        );
    }
    if let Some(when) = report.last_update {
        // The upstream serializes "never synced" as the zero time.
        if when.timestamp() > 0 {
            println!(
                "{}",
                ui::style_text(
                    &format!("Last synced: {}", when.format("%Y-%m-%d %H:%M:%S UTC")),
                    ui::StyleType::Subtle
                )
            );
        }
    }

    Ok(())
}
