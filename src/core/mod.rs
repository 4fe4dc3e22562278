//! Core valuation logic and abstractions

pub mod config;
pub mod edit;
pub mod error;
pub mod log;
pub mod panel;
pub mod portfolio;
pub mod range;
pub mod session;
pub mod valuation;

// Re-export main types for cleaner imports
pub use edit::{EditField, EditRequest};
pub use error::{Error, Result};
pub use panel::{PanelStore, PricePanel};
pub use portfolio::{Holding, Portfolio};
pub use range::SeriesRange;
pub use session::Session;
pub use valuation::{Valuation, evaluate};
