pub mod csv_panel;
pub mod disk;
pub mod memory;

use crate::core::portfolio::Portfolio;
use anyhow::Result;
use async_trait::async_trait;

/// Persists the single active portfolio between sessions.
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn load(&self) -> Result<Option<Portfolio>>;

    async fn save(&self, portfolio: &Portfolio) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}
