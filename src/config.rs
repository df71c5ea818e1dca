//! Run configuration.

use crate::errors::{ReconcileError, ReconcileResult};
use crate::types::ReconciliationWindow;
use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    pub system_trx_path: PathBuf,
    pub bank_trx_path: PathBuf,
    pub report_trx_path: PathBuf,
    pub list_bank: Vec<String>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[serde(default = "default_number_worker")]
    pub number_worker: usize,
    /// Input files start with a header row.
    #[serde(default = "default_has_header")]
    pub has_header: bool,
    #[serde(default)]
    pub is_debug: bool,
    #[serde(default)]
    pub is_delete_current_report_directory: bool,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_number_worker() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_has_header() -> bool {
    true
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reconcile.db")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ReconcileConfig {
    /// Loads `.env`, then an optional `reconcile.toml`, then `RECONCILE__*`
    /// environment variables (later sources win).
    pub fn load() -> ReconcileResult<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("reconcile").required(false))
            .add_source(
                Environment::with_prefix("RECONCILE")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("list_bank"),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReconcileResult<()> {
        if self.from_date > self.to_date {
            return Err(ReconcileError::Config(format!(
                "from_date {} is after to_date {}",
                self.from_date, self.to_date
            )));
        }

        if self.number_worker == 0 {
            return Err(ReconcileError::Config(
                "number_worker must be at least 1".to_string(),
            ));
        }

        if self.list_bank.iter().all(|bank| bank.trim().is_empty()) {
            return Err(ReconcileError::Config("list_bank is empty".to_string()));
        }

        Ok(())
    }

    pub fn window(&self) -> ReconcileResult<ReconciliationWindow> {
        ReconciliationWindow::new(self.from_date, self.to_date, self.list_bank.clone())
    }
}
