//! Valuation engine: derives holdings, rankings and the fund price series
//! from a price panel and a portfolio.
//!
//! Every call recomputes from scratch. Nothing is cached between calls, so
//! evaluating the same inputs twice yields identical output.
use crate::core::error::{Error, Result};
use crate::core::panel::PricePanel;
use crate::core::portfolio::Portfolio;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Number of entries kept in [`Valuation::top_holdings`].
pub const TOP_HOLDINGS_LIMIT: usize = 5;

/// One constituent's weight and latest price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfoRow {
    pub name: String,
    pub weight: f64,
    pub recent_price: f64,
}

/// One constituent's current dollar exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingRow {
    pub name: String,
    pub holdings: f64,
}

/// Daily fund price keyed by date. Serializes with `YYYY-MM-DD` keys.
pub type FundPriceSeries = BTreeMap<NaiveDate, f64>;

/// The three views derived for a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    /// Sorted by name ascending.
    pub table_info: Vec<TableInfoRow>,
    /// Sorted by holdings descending, at most [`TOP_HOLDINGS_LIMIT`] rows.
    pub top_holdings: Vec<HoldingRow>,
    pub etf_price: FundPriceSeries,
}

/// Rounds a monetary amount to 2 decimals, halves away from zero.
///
/// A result of zero is always `+0.0`, so it ties with other zero amounts.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

/// Values `portfolio` against `panel`.
///
/// Fails with [`Error::EmptyPanel`] when the panel has no rows and with
/// [`Error::UnknownInstrument`] when a holding is not a panel column. A
/// missing cell for a held instrument fails with [`Error::MissingPrice`].
pub fn evaluate(panel: &PricePanel, portfolio: &Portfolio) -> Result<Valuation> {
    if panel.is_empty() {
        return Err(Error::EmptyPanel);
    }

    let restricted = panel.restrict(&portfolio.names())?;
    let recent = restricted.most_recent_row()?;
    debug!(
        date = %recent.date,
        instruments = portfolio.len(),
        "Evaluating portfolio"
    );

    let mut table_info = Vec::with_capacity(portfolio.len());
    let mut holdings = Vec::with_capacity(portfolio.len());
    for holding in portfolio.holdings() {
        let price = recent.price(&holding.name)?;
        table_info.push(TableInfoRow {
            name: holding.name.clone(),
            weight: holding.weight,
            recent_price: round2(price),
        });
        holdings.push(HoldingRow {
            name: holding.name.clone(),
            holdings: round2(holding.weight * price),
        });
    }

    table_info.sort_by(|a, b| a.name.cmp(&b.name));
    // sort_by is stable, so ties keep portfolio order
    holdings.sort_by(|a, b| b.holdings.total_cmp(&a.holdings));
    holdings.truncate(TOP_HOLDINGS_LIMIT);

    let etf_price = fund_price_series(&restricted, portfolio)?;

    Ok(Valuation {
        table_info,
        top_holdings: holdings,
        etf_price,
    })
}

/// Weighted sum of prices for every panel date. `restricted` must carry the
/// portfolio's columns in portfolio order.
fn fund_price_series(restricted: &PricePanel, portfolio: &Portfolio) -> Result<FundPriceSeries> {
    restricted
        .rows()
        .map(|(date, prices)| {
            let mut total = 0.0;
            for (holding, price) in portfolio.holdings().iter().zip(prices) {
                let price = price.ok_or_else(|| Error::MissingPrice {
                    instrument: holding.name.clone(),
                    date: *date,
                })?;
                total += holding.weight * price;
            }
            Ok((*date, round2(total)))
        })
        .collect()
}
