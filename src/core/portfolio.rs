//! Fund composition and ingest of uploaded portfolio tables.

use crate::core::error::{Error, Result};
use crate::core::panel::is_missing_cell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub const NAME_COLUMN: &str = "name";
pub const WEIGHT_COLUMN: &str = "weight";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub name: String,
    pub weight: f64,
}

/// Ordered set of holdings with unique names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Holding>", into = "Vec<Holding>")]
pub struct Portfolio {
    holdings: Vec<Holding>,
}

impl TryFrom<Vec<Holding>> for Portfolio {
    type Error = Error;

    fn try_from(holdings: Vec<Holding>) -> Result<Self> {
        Self::new(holdings)
    }
}

impl From<Portfolio> for Vec<Holding> {
    fn from(portfolio: Portfolio) -> Self {
        portfolio.holdings
    }
}

impl Portfolio {
    /// Builds a portfolio, rejecting repeated names.
    pub fn new(holdings: Vec<Holding>) -> Result<Self> {
        let mut seen = HashSet::new();
        for holding in &holdings {
            if !seen.insert(holding.name.as_str()) {
                return Err(Error::DuplicateInstrument(holding.name.clone()));
            }
        }
        Ok(Self { holdings })
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn names(&self) -> Vec<&str> {
        self.holdings.iter().map(|h| h.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn weight(&self, name: &str) -> Option<f64> {
        self.holdings
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.weight)
    }

    /// Overwrites the weight of the first holding called `name`.
    pub fn set_weight(&mut self, name: &str, weight: f64) -> Result<()> {
        let holding = self
            .holdings
            .iter_mut()
            .find(|h| h.name == name)
            .ok_or_else(|| Error::UnknownInstrument(name.to_string()))?;
        debug!(%name, old = holding.weight, new = weight, "Updating weight");
        holding.weight = weight;
        Ok(())
    }

    /// Reads an uploaded table with `name` and `weight` columns.
    ///
    /// Extra columns are ignored. A row with any blank or NA-marked field
    /// (`NA`, `N/A`, `null`, `NaN`, ...) is dropped.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|_| invalid_upload())?
            .clone();
        if headers.is_empty() || headers.iter().all(str::is_empty) {
            return Err(invalid_upload());
        }

        let find = |column: &str| headers.iter().position(|h| h == column);
        let (name_idx, weight_idx) = match (find(NAME_COLUMN), find(WEIGHT_COLUMN)) {
            (Some(n), Some(w)) => (n, w),
            (n, w) => {
                let mut missing = Vec::new();
                if n.is_none() {
                    missing.push(NAME_COLUMN.to_string());
                }
                if w.is_none() {
                    missing.push(WEIGHT_COLUMN.to_string());
                }
                return Err(Error::MissingRequiredField(missing));
            }
        };

        let mut holdings = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|_| invalid_upload())?;
            if record.len() < headers.len() || record.iter().any(is_missing_cell) {
                debug!(row = line + 1, "Dropping incomplete row");
                continue;
            }

            let raw_weight = &record[weight_idx];
            let weight: f64 = raw_weight.parse().map_err(|_| {
                Error::InvalidInput(format!(
                    "Invalid weight '{raw_weight}' for {}",
                    &record[name_idx]
                ))
            })?;
            if weight.is_nan() {
                debug!(row = line + 1, "Dropping row without weight");
                continue;
            }

            holdings.push(Holding {
                name: record[name_idx].to_string(),
                weight,
            });
        }

        debug!(count = holdings.len(), "Parsed uploaded portfolio");
        Self::new(holdings)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref()).map_err(|e| {
            Error::InvalidInput(format!(
                "Failed to open portfolio file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_csv_reader(file)
    }
}

fn invalid_upload() -> Error {
    Error::InvalidInput("Uploaded file is empty or invalid CSV.".to_string())
}
