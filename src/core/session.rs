//! The single live portfolio and the panel store it is valued against.

use crate::core::edit::{EditRequest, apply_edit};
use crate::core::error::{Error, Result};
use crate::core::panel::PanelStore;
use crate::core::portfolio::Portfolio;
use crate::core::valuation::{Valuation, evaluate};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One valuation session.
///
/// Every operation holds the portfolio lock for its whole duration, so an
/// edit's read-modify-write of the panel and the following evaluation never
/// interleave with another call on the same session.
pub struct Session {
    panels: Arc<dyn PanelStore>,
    portfolio: Mutex<Option<Portfolio>>,
}

impl Session {
    pub fn new(panels: Arc<dyn PanelStore>) -> Self {
        Self::resume(panels, None)
    }

    /// Starts a session with a previously established portfolio.
    pub fn resume(panels: Arc<dyn PanelStore>, portfolio: Option<Portfolio>) -> Self {
        Self {
            panels,
            portfolio: Mutex::new(portfolio),
        }
    }

    /// Values `portfolio` and, on success, makes it the active portfolio.
    pub async fn upload(&self, portfolio: Portfolio) -> Result<Valuation> {
        let mut active = self.portfolio.lock().await;
        let panel = self.panels.load()?;
        let valuation = evaluate(&panel, &portfolio)?;
        info!(holdings = portfolio.len(), "Portfolio established");
        *active = Some(portfolio);
        Ok(valuation)
    }

    /// Re-values the active portfolio.
    pub async fn evaluate(&self) -> Result<Valuation> {
        let active = self.portfolio.lock().await;
        let portfolio = active.as_ref().ok_or(Error::NoActivePortfolio)?;
        let panel = self.panels.load()?;
        evaluate(&panel, portfolio)
    }

    /// Applies a single-cell edit to the active portfolio or the panel.
    pub async fn apply_edit(&self, edit: &EditRequest) -> Result<Valuation> {
        let mut active = self.portfolio.lock().await;
        let portfolio = active.as_mut().ok_or(Error::NoActivePortfolio)?;
        apply_edit(portfolio, self.panels.as_ref(), edit)
    }

    pub async fn portfolio(&self) -> Option<Portfolio> {
        self.portfolio.lock().await.clone()
    }

    pub async fn clear(&self) {
        debug!("Clearing active portfolio");
        self.portfolio.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::edit::EditField;
    use crate::core::panel::PricePanel;
    use crate::core::portfolio::Holding;
    use crate::store::memory::MemoryPanelStore;
    use chrono::NaiveDate;

    fn panels() -> Arc<dyn PanelStore> {
        let mut panel = PricePanel::new("", vec!["A".into(), "B".into()]);
        for (d, a, b) in [(1, 10.0, 4.0), (2, 11.0, 4.5), (3, 10.0, 5.0)] {
            panel
                .insert_row(
                    NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                    vec![Some(a), Some(b)],
                )
                .unwrap();
        }
        Arc::new(MemoryPanelStore::new(panel))
    }

    fn portfolio(entries: &[(&str, f64)]) -> Portfolio {
        Portfolio::new(
            entries
                .iter()
                .map(|(name, weight)| Holding {
                    name: name.to_string(),
                    weight: *weight,
                })
                .collect(),
        )
        .unwrap()
    }

    fn weight_edit(key: &str, value: f64) -> EditRequest {
        EditRequest {
            key: key.to_string(),
            field: EditField::Weight,
            value,
        }
    }

    #[tokio::test]
    async fn test_edit_without_portfolio() {
        let session = Session::new(panels());
        assert_eq!(
            session.apply_edit(&weight_edit("A", 1.0)).await,
            Err(Error::NoActivePortfolio)
        );
        assert_eq!(session.evaluate().await, Err(Error::NoActivePortfolio));
    }

    #[tokio::test]
    async fn test_upload_then_edit() {
        let session = Session::new(panels());
        let first = session
            .upload(portfolio(&[("A", 0.5), ("B", 1.0)]))
            .await
            .unwrap();
        assert_eq!(session.evaluate().await.unwrap(), first);

        let edited = session.apply_edit(&weight_edit("A", 2.0)).await.unwrap();
        assert_eq!(edited.top_holdings[0].holdings, 20.0);
        assert_eq!(
            session.portfolio().await.unwrap().weight("A"),
            Some(2.0)
        );
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_previous_portfolio() {
        let session = Session::new(panels());
        session.upload(portfolio(&[("A", 1.0)])).await.unwrap();

        let result = session.upload(portfolio(&[("Z", 1.0)])).await;
        assert_eq!(result, Err(Error::UnknownInstrument("Z".to_string())));
        assert_eq!(session.portfolio().await, Some(portfolio(&[("A", 1.0)])));
    }

    #[tokio::test]
    async fn test_concurrent_edits_are_serialized() {
        let session = Arc::new(Session::new(panels()));
        session
            .upload(portfolio(&[("A", 0.0), ("B", 1.0)]))
            .await
            .unwrap();

        let tasks: Vec<_> = (1..=20)
            .map(|i| {
                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    session
                        .apply_edit(&EditRequest {
                            key: "B".to_string(),
                            field: EditField::RecentPrice,
                            value: i as f64,
                        })
                        .await
                })
            })
            .collect();
        for task in tasks {
            let valuation = task.await.unwrap().unwrap();
            // Each result reflects exactly the write made under its own lock
            let b = &valuation.table_info[1];
            assert_eq!(valuation.top_holdings.len(), 2);
            assert_eq!(valuation.etf_price.values().next_back(), Some(&b.recent_price));
        }
    }

    #[tokio::test]
    async fn test_clear() {
        let session = Session::resume(panels(), Some(portfolio(&[("A", 1.0)])));
        assert!(session.evaluate().await.is_ok());
        session.clear().await;
        assert_eq!(session.evaluate().await, Err(Error::NoActivePortfolio));
    }
}
