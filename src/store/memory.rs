use crate::core::error::{Error, Result};
use crate::core::panel::{PanelStore, PricePanel};
use crate::core::portfolio::Portfolio;
use crate::store::PortfolioStore;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory price panel, used where no file should be touched.
pub struct MemoryPanelStore {
    panel: RwLock<PricePanel>,
}

impl MemoryPanelStore {
    pub fn new(panel: PricePanel) -> Self {
        Self {
            panel: RwLock::new(panel),
        }
    }
}

fn poisoned() -> Error {
    Error::PanelUnavailable("panel lock poisoned".to_string())
}

impl PanelStore for MemoryPanelStore {
    fn load(&self) -> Result<PricePanel> {
        Ok(self.panel.read().map_err(|_| poisoned())?.clone())
    }

    fn save(&self, panel: &PricePanel) -> Result<()> {
        *self.panel.write().map_err(|_| poisoned())? = panel.clone();
        debug!(rows = panel.len(), "Panel SAVE");
        Ok(())
    }
}

/// In-memory portfolio store. Forgets everything when dropped.
#[derive(Default, Clone)]
pub struct MemoryPortfolioStore {
    inner: Arc<Mutex<Option<Portfolio>>>,
}

impl MemoryPortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PortfolioStore for MemoryPortfolioStore {
    async fn load(&self) -> anyhow::Result<Option<Portfolio>> {
        let portfolio = self.inner.lock().await.clone();
        debug!(found = portfolio.is_some(), "Portfolio GET");
        Ok(portfolio)
    }

    async fn save(&self, portfolio: &Portfolio) -> anyhow::Result<()> {
        *self.inner.lock().await = Some(portfolio.clone());
        debug!("Portfolio PUT");
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        self.inner.lock().await.take();
        debug!("Portfolio CLEAR");
        Ok(())
    }
}
