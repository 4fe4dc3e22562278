use crate::core::portfolio::Portfolio;
use crate::store::PortfolioStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const SESSION_PARTITION: &str = "session";
const ACTIVE_PORTFOLIO_KEY: &str = "active_portfolio";

/// Keeps the active portfolio in a fjall keyspace so it outlives the process.
pub struct DiskPortfolioStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskPortfolioStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path.join("session"))
            .open()
            .with_context(|| format!("Failed to open session store in {}", path.display()))?;
        let partition =
            keyspace.open_partition(SESSION_PARTITION, PartitionCreateOptions::default())?;
        debug!(path = %path.display(), "Opened session store");

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl PortfolioStore for DiskPortfolioStore {
    async fn load(&self) -> Result<Option<Portfolio>> {
        let Some(bytes) = self.partition.get(ACTIVE_PORTFOLIO_KEY)? else {
            debug!("Portfolio MISS");
            return Ok(None);
        };
        let portfolio = serde_json::from_slice(&bytes).context("Corrupt stored portfolio")?;
        debug!("Portfolio HIT");
        Ok(Some(portfolio))
    }

    async fn save(&self, portfolio: &Portfolio) -> Result<()> {
        self.partition
            .insert(ACTIVE_PORTFOLIO_KEY, serde_json::to_vec(portfolio)?)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(holdings = portfolio.len(), "Portfolio PUT");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.partition.remove(ACTIVE_PORTFOLIO_KEY)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Portfolio CLEAR");
        Ok(())
    }
}
