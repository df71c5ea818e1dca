//! Batch reconciliation of an internal transaction ledger against per-bank
//! CSV statement exports.
//!
//! ```rust,ignore
//! use bank_reconcile::{
//!     CancellationToken, OsFileSystem, ParserRegistry, ReconcileConfig, Reconciler,
//!     StagingStore, TracingProgress,
//! };
//!
//! let config = ReconcileConfig::load()?;
//! let store = StagingStore::open(&config.db_path)?;
//! let outcome = Reconciler::new(config, ParserRegistry::with_defaults(), OsFileSystem)?
//!     .run(store, &TracingProgress, &CancellationToken::new())?;
//! ```

pub mod config;
pub mod errors;
pub mod fs;
pub mod parsers;
pub mod reconcile;
pub mod store;
pub mod types;

pub use crate::config::ReconcileConfig;
pub use errors::{ReconcileError, ReconcileResult};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use parsers::prelude::*;
pub use reconcile::{
    NoProgress, Progress, ReconciliationOutcome, Reconciler, ReportFiles, TracingProgress,
};
pub use store::{ReconciliationSummary, StagingRepository, StagingStore};
pub use tokio_util::sync::CancellationToken;
pub use types::{BankTrxRecord, ReconciliationWindow, SystemTrxRecord, TrxData, TrxType};
