//! Historical price panel and the store abstraction that owns it.

use crate::core::error::{Error, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Cell values that read as "no value", beyond the empty string.
const MISSING_TOKENS: [&str; 17] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "null",
];

/// Whether a raw table cell carries no value.
pub fn is_missing_cell(cell: &str) -> bool {
    cell.is_empty()
        || cell.eq_ignore_ascii_case("nan")
        || MISSING_TOKENS.iter().any(|token| *token == cell)
}

/// A date-indexed table of prices with one column per instrument.
///
/// Rows are kept in ascending date order and dates are unique. A cell is
/// `None` when the source had no value for that instrument on that date.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePanel {
    index_label: String,
    instruments: Vec<String>,
    rows: BTreeMap<NaiveDate, Vec<Option<f64>>>,
}

/// The latest row of a panel, flattened to instrument -> price.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentRow {
    pub date: NaiveDate,
    pub prices: HashMap<String, f64>,
}

impl RecentRow {
    pub fn price(&self, instrument: &str) -> Result<f64> {
        self.prices
            .get(instrument)
            .copied()
            .ok_or_else(|| Error::MissingPrice {
                instrument: instrument.to_string(),
                date: self.date,
            })
    }
}

impl PricePanel {
    pub fn new(index_label: impl Into<String>, instruments: Vec<String>) -> Self {
        Self {
            index_label: index_label.into(),
            instruments,
            rows: BTreeMap::new(),
        }
    }

    /// Label of the date column, kept so a rewrite reproduces the header.
    pub fn index_label(&self) -> &str {
        &self.index_label
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in ascending date order.
    pub fn rows(&self) -> impl Iterator<Item = (&NaiveDate, &[Option<f64>])> {
        self.rows.iter().map(|(date, values)| (date, values.as_slice()))
    }

    /// Appends a row. Fails if the date is already present or the row width
    /// does not match the instrument columns.
    pub fn insert_row(&mut self, date: NaiveDate, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.instruments.len() {
            return Err(Error::PanelUnavailable(format!(
                "row for {date} has {} values, expected {}",
                values.len(),
                self.instruments.len()
            )));
        }
        if self.rows.contains_key(&date) {
            return Err(Error::PanelUnavailable(format!("duplicate date {date}")));
        }
        self.rows.insert(date, values);
        Ok(())
    }

    fn column(&self, instrument: &str) -> Result<usize> {
        self.instruments
            .iter()
            .position(|name| name == instrument)
            .ok_or_else(|| Error::UnknownInstrument(instrument.to_string()))
    }

    /// Returns a panel holding only the named columns, in the order given.
    pub fn restrict(&self, instruments: &[&str]) -> Result<PricePanel> {
        let columns = instruments
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<Vec<_>>>()?;

        let rows = self
            .rows
            .iter()
            .map(|(date, values)| (*date, columns.iter().map(|&c| values[c]).collect()))
            .collect();

        Ok(PricePanel {
            index_label: self.index_label.clone(),
            instruments: instruments.iter().map(|name| name.to_string()).collect(),
            rows,
        })
    }

    /// The row with the maximum date. Instruments without a value on that
    /// date are left out of the mapping.
    pub fn most_recent_row(&self) -> Result<RecentRow> {
        let (date, values) = self.rows.last_key_value().ok_or(Error::EmptyPanel)?;
        let prices = self
            .instruments
            .iter()
            .zip(values)
            .filter_map(|(name, value)| value.map(|v| (name.clone(), v)))
            .collect();
        Ok(RecentRow {
            date: *date,
            prices,
        })
    }

    /// Overwrites one instrument's price in the most recent row and returns
    /// the date that was touched.
    pub fn set_recent_price(&mut self, instrument: &str, value: f64) -> Result<NaiveDate> {
        let column = self.column(instrument)?;
        let mut latest = self.rows.last_entry().ok_or(Error::EmptyPanel)?;
        latest.get_mut()[column] = Some(value);
        Ok(*latest.key())
    }
}

/// Owner of the persisted price panel.
///
/// Implementations only need to read and write the whole panel; single-cell
/// edits are built on top of that and carry no partial-write recovery.
pub trait PanelStore: Send + Sync {
    /// Reads the full panel, sorted ascending by date.
    fn load(&self) -> Result<PricePanel>;

    /// Replaces the persisted panel.
    fn save(&self, panel: &PricePanel) -> Result<()>;

    /// Overwrites `instrument` in the most recent row and persists the panel.
    fn write_recent_cell(&self, instrument: &str, value: f64) -> Result<()> {
        let mut panel = self.load()?;
        let date = panel.set_recent_price(instrument, value)?;
        debug!(%instrument, %date, value, "Writing most recent price");
        self.save(&panel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_cells() {
        for cell in ["", "NA", "N/A", "null", "NULL", "NaN", "nan", "<NA>", "#N/A"] {
            assert!(is_missing_cell(cell), "{cell:?} should be missing");
        }
        for cell in ["0", "1.5", "name", "Nano", "na"] {
            assert!(!is_missing_cell(cell), "{cell:?} should be a value");
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sample_panel() -> PricePanel {
        let mut panel = PricePanel::new("", vec!["A".into(), "B".into(), "C".into()]);
        // Inserted out of order on purpose
        panel
            .insert_row(date(3), vec![Some(10.0), Some(5.0), None])
            .unwrap();
        panel
            .insert_row(date(1), vec![Some(8.0), Some(4.0), Some(1.0)])
            .unwrap();
        panel
            .insert_row(date(2), vec![Some(9.0), Some(4.5), Some(1.5)])
            .unwrap();
        panel
    }

    #[test]
    fn test_rows_are_sorted_by_date() {
        let panel = sample_panel();
        let dates: Vec<_> = panel.rows().map(|(d, _)| *d).collect();
        assert_eq!(dates, vec![date(1), date(2), date(3)]);
    }

    #[test]
    fn test_insert_row_rejects_duplicates_and_ragged_rows() {
        let mut panel = sample_panel();
        assert!(matches!(
            panel.insert_row(date(2), vec![None, None, None]),
            Err(Error::PanelUnavailable(_))
        ));
        assert!(matches!(
            panel.insert_row(date(4), vec![Some(1.0)]),
            Err(Error::PanelUnavailable(_))
        ));
        assert_eq!(panel.len(), 3);
    }

    #[test]
    fn test_restrict_keeps_requested_columns() {
        let panel = sample_panel();
        let restricted = panel.restrict(&["B", "A"]).unwrap();
        assert_eq!(restricted.instruments(), &["B".to_string(), "A".to_string()]);
        let first = restricted.rows().next().unwrap();
        assert_eq!(first.1, &[Some(4.0), Some(8.0)]);

        assert_eq!(
            panel.restrict(&["A", "Z"]),
            Err(Error::UnknownInstrument("Z".to_string()))
        );
    }

    #[test]
    fn test_most_recent_row() {
        let panel = sample_panel();
        let recent = panel.most_recent_row().unwrap();
        assert_eq!(recent.date, date(3));
        assert_eq!(recent.price("A"), Ok(10.0));
        assert_eq!(recent.price("B"), Ok(5.0));
        assert_eq!(
            recent.price("C"),
            Err(Error::MissingPrice {
                instrument: "C".to_string(),
                date: date(3)
            })
        );

        let empty = PricePanel::new("date", vec!["A".into()]);
        assert_eq!(empty.most_recent_row(), Err(Error::EmptyPanel));
    }

    #[test]
    fn test_set_recent_price_touches_only_latest_row() {
        let mut panel = sample_panel();
        let touched = panel.set_recent_price("A", 12.0).unwrap();
        assert_eq!(touched, date(3));

        let rows: Vec<_> = panel.rows().map(|(_, v)| v[0]).collect();
        assert_eq!(rows, vec![Some(8.0), Some(9.0), Some(12.0)]);

        assert_eq!(
            panel.set_recent_price("Z", 1.0),
            Err(Error::UnknownInstrument("Z".to_string()))
        );
    }
}
