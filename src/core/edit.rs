//! Single-cell corrections followed by a full re-evaluation.

use crate::core::error::{Error, Result};
use crate::core::panel::PanelStore;
use crate::core::portfolio::Portfolio;
use crate::core::valuation::{Valuation, evaluate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditField {
    Weight,
    RecentPrice,
}

impl Display for EditField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EditField::Weight => "weight",
                EditField::RecentPrice => "recent_price",
            }
        )
    }
}

impl FromStr for EditField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "weight" => Ok(EditField::Weight),
            "recent_price" | "recent-price" | "price" => Ok(EditField::RecentPrice),
            _ => Err(Error::InvalidInput(format!("Invalid field: {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRequest {
    pub key: String,
    pub field: EditField,
    pub value: f64,
}

/// Applies `edit` in place and re-evaluates.
///
/// A price edit is persisted through `panels` before evaluation and a weight
/// edit mutates `portfolio`. Neither is undone if the evaluation fails.
pub fn apply_edit(
    portfolio: &mut Portfolio,
    panels: &dyn PanelStore,
    edit: &EditRequest,
) -> Result<Valuation> {
    info!(key = %edit.key, field = %edit.field, value = edit.value, "Applying edit");
    if edit.value.is_nan() {
        return Err(Error::InvalidInput(format!(
            "Invalid {} for {}: not a number",
            edit.field, edit.key
        )));
    }
    match edit.field {
        EditField::RecentPrice => panels.write_recent_cell(&edit.key, edit.value)?,
        EditField::Weight => portfolio.set_weight(&edit.key, edit.value)?,
    }

    let panel = panels.load()?;
    evaluate(&panel, portfolio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::panel::PricePanel;
    use crate::core::portfolio::Holding;
    use crate::core::valuation::HoldingRow;
    use crate::store::memory::MemoryPanelStore;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn store() -> MemoryPanelStore {
        let mut panel = PricePanel::new("", vec!["A".into(), "B".into(), "X".into()]);
        panel
            .insert_row(date(1), vec![Some(10.0), Some(4.0), Some(1.0)])
            .unwrap();
        panel
            .insert_row(date(2), vec![Some(11.0), Some(4.5), Some(1.0)])
            .unwrap();
        panel
            .insert_row(date(3), vec![Some(10.0), Some(5.0), Some(1.0)])
            .unwrap();
        MemoryPanelStore::new(panel)
    }

    fn sample_portfolio() -> Portfolio {
        Portfolio::new(vec![
            Holding {
                name: "A".to_string(),
                weight: 0.5,
            },
            Holding {
                name: "B".to_string(),
                weight: 1.0,
            },
        ])
        .unwrap()
    }

    fn edit(key: &str, field: EditField, value: f64) -> EditRequest {
        EditRequest {
            key: key.to_string(),
            field,
            value,
        }
    }

    #[test]
    fn test_parse_field() {
        assert_eq!("weight".parse::<EditField>(), Ok(EditField::Weight));
        assert_eq!(
            "Recent_Price".parse::<EditField>(),
            Ok(EditField::RecentPrice)
        );
        assert!("units".parse::<EditField>().is_err());
        assert_eq!(EditField::RecentPrice.to_string(), "recent_price");
    }

    #[test]
    fn test_edit_request_wire_shape() {
        let request: EditRequest =
            serde_json::from_str(r#"{"key": "C", "field": "recent_price", "value": 25.0}"#)
                .unwrap();
        assert_eq!(request, edit("C", EditField::RecentPrice, 25.0));
    }

    #[test]
    fn test_weight_edit() {
        let panels = store();
        let mut portfolio = sample_portfolio();
        let valuation =
            apply_edit(&mut portfolio, &panels, &edit("A", EditField::Weight, 2.0)).unwrap();

        assert_eq!(portfolio.weight("A"), Some(2.0));
        assert_eq!(
            valuation.top_holdings,
            vec![
                HoldingRow {
                    name: "A".to_string(),
                    holdings: 20.0
                },
                HoldingRow {
                    name: "B".to_string(),
                    holdings: 5.0
                },
            ]
        );
        assert_eq!(valuation.table_info[0].weight, 2.0);
    }

    #[test]
    fn test_price_edit_changes_only_latest_date() {
        let panels = store();
        let mut portfolio = sample_portfolio();
        let before = evaluate(&panels.load().unwrap(), &portfolio).unwrap();

        let after = apply_edit(
            &mut portfolio,
            &panels,
            &edit("A", EditField::RecentPrice, 12.0),
        )
        .unwrap();

        assert_eq!(after.etf_price[&date(1)], before.etf_price[&date(1)]);
        assert_eq!(after.etf_price[&date(2)], before.etf_price[&date(2)]);
        assert_eq!(after.etf_price[&date(3)], 11.0);
        assert_eq!(after.table_info[0].recent_price, 12.0);
        assert_eq!(after.top_holdings[0].name, "A");
        assert_eq!(after.top_holdings[0].holdings, 6.0);
        // The B row is untouched
        assert_eq!(after.table_info[1], before.table_info[1]);

        // Persisted in the store, not only in the returned view
        let recent = panels.load().unwrap().most_recent_row().unwrap();
        assert_eq!(recent.price("A"), Ok(12.0));
    }

    #[test]
    fn test_price_edit_for_unheld_instrument_is_kept() {
        let panels = store();
        let mut portfolio = sample_portfolio();
        apply_edit(
            &mut portfolio,
            &panels,
            &edit("X", EditField::RecentPrice, 3.0),
        )
        .unwrap();
        let recent = panels.load().unwrap().most_recent_row().unwrap();
        assert_eq!(recent.price("X"), Ok(3.0));
    }

    #[test]
    fn test_unknown_key() {
        let panels = store();
        let mut portfolio = sample_portfolio();
        assert_eq!(
            apply_edit(&mut portfolio, &panels, &edit("Z", EditField::Weight, 1.0)),
            Err(Error::UnknownInstrument("Z".to_string()))
        );
        assert_eq!(
            apply_edit(
                &mut portfolio,
                &panels,
                &edit("Z", EditField::RecentPrice, 1.0)
            ),
            Err(Error::UnknownInstrument("Z".to_string()))
        );
        assert_eq!(portfolio, sample_portfolio());
    }

    #[test]
    fn test_nan_value_rejected() {
        let panels = store();
        let mut portfolio = sample_portfolio();
        assert!(matches!(
            apply_edit(
                &mut portfolio,
                &panels,
                &edit("A", EditField::Weight, f64::NAN)
            ),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(portfolio.weight("A"), Some(0.5));
    }

    #[test]
    fn test_price_edit_survives_failed_evaluation() {
        let panels = store();
        // X is in the panel, Q is not: the write lands, evaluation fails
        let mut portfolio = Portfolio::new(vec![Holding {
            name: "Q".to_string(),
            weight: 1.0,
        }])
        .unwrap();
        let result = apply_edit(
            &mut portfolio,
            &panels,
            &edit("X", EditField::RecentPrice, 7.0),
        );
        assert_eq!(result, Err(Error::UnknownInstrument("Q".to_string())));

        let recent = panels.load().unwrap().most_recent_row().unwrap();
        assert_eq!(recent.price("X"), Ok(7.0));
    }
}
