//! Error types for fund valuation.

use chrono::NaiveDate;
use thiserror::Error;

/// Type alias for Result using the valuation [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by the panel store, the valuation engine and the session.
///
/// All of them are terminal for the call that raised them. The caller decides
/// how to present each kind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Price panel unavailable: {0}")]
    PanelUnavailable(String),

    #[error("Price panel has no rows")]
    EmptyPanel,

    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("No price for {instrument} on {date}")]
    MissingPrice { instrument: String, date: NaiveDate },

    #[error("Missing columns in uploaded file: {}", .0.join(", "))]
    MissingRequiredField(Vec<String>),

    #[error("Duplicate instrument in uploaded file: {0}")]
    DuplicateInstrument(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("No uploaded file found. Please upload a CSV file first.")]
    NoActivePortfolio,
}
