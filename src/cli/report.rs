//! Human and JSON renderings of a [`Valuation`].

use super::ui;
use crate::core::range::SeriesRange;
use crate::core::valuation::{FundPriceSeries, Valuation};
use anyhow::Result;
use comfy_table::Cell;

/// Percent change from the first to the last entry of `series`.
pub fn window_change(series: &FundPriceSeries) -> Option<f64> {
    let first = *series.values().next()?;
    let last = *series.values().next_back()?;
    if series.len() < 2 || first == 0.0 {
        return None;
    }
    Some((last - first) / first.abs() * 100.0)
}

pub fn render(valuation: &Valuation, range: SeriesRange) -> String {
    let mut output = format!(
        "{}\n{}\n\n",
        ui::style_text("Holdings", ui::StyleType::Title),
        holdings_table(valuation)
    );

    output.push_str(&format!(
        "{}\n{}\n\n",
        ui::style_text("Top Holdings by Value", ui::StyleType::Title),
        top_holdings_table(valuation)
    ));

    let series = range.filter(&valuation.etf_price);
    output.push_str(&format!(
        "{} {}\n{}",
        ui::style_text("ETF Price", ui::StyleType::Title),
        ui::style_text(&format!("({range})"), ui::StyleType::Subtle),
        series_table(&series)
    ));

    if let Some(last) = series.values().next_back() {
        output.push_str(&format!(
            "\n\n{}: {}",
            ui::style_text("Latest ETF Price", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{last:.2}"), ui::StyleType::TotalValue)
        ));
    }
    output
}

/// The result surface as JSON. The price series always covers every panel
/// date; windows only apply to [`render`].
pub fn render_json(valuation: &Valuation) -> Result<String> {
    Ok(serde_json::to_string_pretty(valuation)?)
}

fn holdings_table(valuation: &Valuation) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Name"),
        ui::header_cell("Weight"),
        ui::header_cell("Recent Price"),
    ]);
    for row in &valuation.table_info {
        table.add_row(vec![
            Cell::new(&row.name),
            ui::weight_cell(row.weight),
            ui::amount_cell(row.recent_price),
        ]);
    }
    table.to_string()
}

fn top_holdings_table(valuation: &Valuation) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Name"),
        ui::header_cell("Holdings"),
    ]);
    for (rank, row) in valuation.top_holdings.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&row.name),
            ui::amount_cell(row.holdings),
        ]);
    }
    table.to_string()
}

fn series_table(series: &FundPriceSeries) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Date"), ui::header_cell("Price")]);
    for (date, price) in series {
        table.add_row(vec![Cell::new(date), ui::amount_cell(*price)]);
    }
    table.add_row(vec![
        Cell::new(ui::style_text("Change", ui::StyleType::TotalLabel)),
        window_change(series).map_or_else(ui::na_cell, ui::change_cell),
    ]);
    table.to_string()
}
