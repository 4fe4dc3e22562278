//! Trailing windows over the fund price series.

use crate::core::error::Error;
use crate::core::valuation::FundPriceSeries;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SeriesRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "1week")]
    OneWeek,
    #[serde(rename = "1month")]
    OneMonth,
    #[serde(rename = "3months")]
    ThreeMonths,
}

impl Display for SeriesRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SeriesRange::All => "All",
                SeriesRange::OneWeek => "1W",
                SeriesRange::OneMonth => "1M",
                SeriesRange::ThreeMonths => "3M",
            }
        )
    }
}

impl FromStr for SeriesRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(SeriesRange::All),
            "1w" | "1week" => Ok(SeriesRange::OneWeek),
            "1m" | "1month" => Ok(SeriesRange::OneMonth),
            "3m" | "3months" => Ok(SeriesRange::ThreeMonths),
            _ => Err(Error::InvalidInput(format!("Invalid series range: {s}"))),
        }
    }
}

impl SeriesRange {
    pub fn to_duration(&self) -> Option<Duration> {
        match self {
            SeriesRange::All => None,
            SeriesRange::OneWeek => Some(Duration::days(7)),
            SeriesRange::OneMonth => Some(Duration::days(30)),
            SeriesRange::ThreeMonths => Some(Duration::days(90)),
        }
    }

    /// Entries dated on or after the series' last date minus the window.
    pub fn filter(&self, series: &FundPriceSeries) -> FundPriceSeries {
        let start = match (self.to_duration(), series.keys().next_back()) {
            (Some(window), Some(last)) => *last - window,
            _ => return series.clone(),
        };
        series
            .range(start..)
            .map(|(date, price)| (*date, *price))
            .collect()
    }
}
