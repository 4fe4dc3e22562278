//! Terminal presentation and setup helpers

pub mod report;
pub mod setup;
pub mod ui;
