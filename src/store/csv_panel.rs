//! Price panel persisted as a CSV file.
//!
//! The first column is the date index, every other column an instrument.
//! Blank cells and the usual NA markers (`NaN`, `NA`, `N/A`, `null`, ...) are
//! missing prices.

use crate::core::error::{Error, Result};
use crate::core::panel::{PanelStore, PricePanel, is_missing_cell};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvPanelStore {
    path: PathBuf,
}

impl CsvPanelStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> Error {
        Error::PanelUnavailable(format!("{}: {reason}", self.path.display()))
    }
}

/// Parses a date index cell, dropping any time component.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok().or_else(|| {
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|dt| dt.date())
    })
}

impl PanelStore for CsvPanelStore {
    fn load(&self) -> Result<PricePanel> {
        debug!(path = %self.path.display(), "Loading price panel");
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| self.unavailable(e))?;

        let headers = reader.headers().map_err(|e| self.unavailable(e))?.clone();
        let mut columns = headers.iter();
        let index_label = columns
            .next()
            .ok_or_else(|| self.unavailable("file is empty"))?
            .to_string();
        let instruments: Vec<String> = columns.map(str::to_string).collect();
        if instruments.is_empty() {
            return Err(self.unavailable("no instrument columns"));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = instruments.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(
                self.unavailable(format!("duplicate instrument column '{duplicate}'"))
            );
        }

        let mut panel = PricePanel::new(index_label, instruments);
        for record in reader.records() {
            let record = record.map_err(|e| self.unavailable(e))?;
            let raw_date = &record[0];
            let date = parse_date(raw_date)
                .ok_or_else(|| self.unavailable(format!("invalid date '{raw_date}'")))?;

            let values = record
                .iter()
                .skip(1)
                .map(|cell| {
                    if is_missing_cell(cell) {
                        return Ok(None);
                    }
                    let price = cell.parse::<f64>().map_err(|_| {
                        self.unavailable(format!("invalid price '{cell}' on {date}"))
                    })?;
                    Ok(Some(price).filter(|p| !p.is_nan()))
                })
                .collect::<Result<Vec<_>>>()?;

            panel.insert_row(date, values)?;
        }

        debug!(rows = panel.len(), "Loaded price panel");
        Ok(panel)
    }

    fn save(&self, panel: &PricePanel) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path).map_err(|e| self.unavailable(e))?;

        let header = std::iter::once(panel.index_label())
            .chain(panel.instruments().iter().map(String::as_str));
        writer
            .write_record(header)
            .map_err(|e| self.unavailable(e))?;

        for (date, values) in panel.rows() {
            let record = std::iter::once(date.format(DATE_FORMAT).to_string()).chain(
                values
                    .iter()
                    .map(|v| v.map(|price| price.to_string()).unwrap_or_default()),
            );
            writer
                .write_record(record)
                .map_err(|e| self.unavailable(e))?;
        }

        writer.flush().map_err(|e| self.unavailable(e))?;
        debug!(path = %self.path.display(), rows = panel.len(), "Saved price panel");
        Ok(())
    }
}
