pub mod cli;
pub mod core;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{EditRequest, PanelStore, Portfolio, SeriesRange, Session, Valuation};
use crate::store::PortfolioStore;
use crate::store::csv_panel::CsvPanelStore;
use crate::store::disk::DiskPortfolioStore;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Upload a portfolio table and make it the active portfolio.
    Process { file: PathBuf },
    /// Correct a weight or the most recent price.
    Update(EditRequest),
    /// Re-value the active portfolio.
    Show,
    /// Forget the active portfolio.
    Reset,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    /// Overrides the configured series window.
    pub range: Option<SeriesRange>,
}

/// A session wired to its panel and portfolio stores.
pub struct App {
    config: AppConfig,
    session: Session,
    portfolios: Arc<dyn PortfolioStore>,
}

impl App {
    /// Opens the CSV panel and the on-disk session store named by `config`.
    pub async fn open(config: AppConfig) -> Result<Self> {
        let panels = Arc::new(CsvPanelStore::new(&config.prices_path));
        let portfolios = Arc::new(DiskPortfolioStore::open(&config.default_data_path()?)?);
        Self::with_stores(config, panels, portfolios).await
    }

    /// Resumes the stored portfolio, if any, against `panels`.
    pub async fn with_stores(
        config: AppConfig,
        panels: Arc<dyn PanelStore>,
        portfolios: Arc<dyn PortfolioStore>,
    ) -> Result<Self> {
        let active = portfolios.load().await?;
        debug!(resumed = active.is_some(), "Starting session");
        Ok(Self {
            config,
            session: Session::resume(panels, active),
            portfolios,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs `command` and returns the resulting views. `Reset` yields `None`.
    pub async fn execute(&self, command: &AppCommand) -> Result<Option<Valuation>> {
        match command {
            AppCommand::Process { file } => {
                info!(file = %file.display(), "Processing portfolio");
                let portfolio = Portfolio::from_path(file)?;
                let valuation = self.session.upload(portfolio).await?;
                self.persist_portfolio().await?;
                Ok(Some(valuation))
            }
            AppCommand::Update(edit) => {
                let result = self.session.apply_edit(edit).await;
                // Weight edits stay applied even when re-evaluation fails
                self.persist_portfolio().await?;
                Ok(Some(result?))
            }
            AppCommand::Show => Ok(Some(self.session.evaluate().await?)),
            AppCommand::Reset => {
                self.session.clear().await;
                self.portfolios.clear().await?;
                info!("Active portfolio cleared");
                Ok(None)
            }
        }
    }

    async fn persist_portfolio(&self) -> Result<()> {
        if let Some(portfolio) = self.session.portfolio().await {
            self.portfolios.save(&portfolio).await?;
        }
        Ok(())
    }
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    options: OutputOptions,
) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let range = options.range.unwrap_or(config.series_range);
    let app = App::open(config).await?;

    let outcome = app.execute(&command).await?;
    println!("{}", format_outcome(outcome.as_ref(), options.json, range)?);
    Ok(())
}

/// Formats a command's outcome for the terminal. `range` only windows the
/// human report; JSON carries the full series.
pub fn format_outcome(
    outcome: Option<&Valuation>,
    json: bool,
    range: SeriesRange,
) -> Result<String> {
    match outcome {
        Some(valuation) if json => cli::report::render_json(valuation),
        Some(valuation) => Ok(cli::report::render(valuation, range)),
        None => Ok("Active portfolio cleared.".to_string()),
    }
}
