use super::ingest::{Ingestor, build_worker_pool};
use super::progress::Progress;
use super::report::{ReportFiles, ReportWriter};
use crate::config::ReconcileConfig;
use crate::errors::{ReconcileError, ReconcileResult};
use crate::fs::FileSystem;
use crate::parsers::banks::ParserRegistry;
use crate::store::{ReconciliationSummary, StagingRepository};
use crate::types::{ReconciliationWindow, TrxData};
use rayon::ThreadPool;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const STAGE_PRE: &str = "[1/7] Pre Process Generate Reconciliation...";
pub const STAGE_PARSE: &str = "[2/7] Parse System/Bank Trx Files...";
pub const STAGE_IMPORT_SYSTEM: &str = "[3/7] Import System Trx to DB...";
pub const STAGE_IMPORT_BANK: &str = "[4/7] Import Bank Trx to DB...";
pub const STAGE_MAP: &str = "[5/7] Mapping Reconciliation Data...";
pub const STAGE_REPORT: &str = "[6/7] Generate Reconciliation Report Files...";
pub const STAGE_POST: &str = "[7/7] Post Process Generate Reconciliation...";

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationOutcome {
    pub summary: ReconciliationSummary,
    pub files: ReportFiles,
}

/// Runs the reconciliation pipeline for one configured window.
pub struct Reconciler {
    config: ReconcileConfig,
    window: ReconciliationWindow,
    registry: ParserRegistry,
    fs: Box<dyn FileSystem>,
    pool: ThreadPool,
    run_timestamp: Option<i64>,
}

impl Reconciler {
    pub fn new(
        config: ReconcileConfig,
        registry: ParserRegistry,
        fs: impl FileSystem + 'static,
    ) -> ReconcileResult<Self> {
        config.validate()?;
        let window = config.window()?;
        let pool = build_worker_pool(config.number_worker)?;

        Ok(Self {
            config,
            window,
            registry,
            fs: Box::new(fs),
            pool,
            run_timestamp: None,
        })
    }

    /// Fixes the timestamp used in report file names instead of the clock.
    pub fn with_run_timestamp(mut self, timestamp: i64) -> Self {
        self.run_timestamp = Some(timestamp);
        self
    }

    pub fn window(&self) -> &ReconciliationWindow {
        &self.window
    }

    /// Runs every stage in order and stops at the first failure. `store` is
    /// closed on every path.
    pub fn run<S: StagingRepository>(
        &self,
        mut store: S,
        progress: &dyn Progress,
        cancel: &CancellationToken,
    ) -> ReconcileResult<ReconciliationOutcome> {
        let timestamp = self
            .run_timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp());
        info!(
            from = %self.window.from_date,
            to = %self.window.to_date,
            banks = ?self.window.accepted_banks,
            workers = self.config.number_worker,
            timestamp,
            "reconciliation started"
        );

        let result = self.run_stages(&mut store, timestamp, progress, cancel);

        if let Err(e) = store.close() {
            warn!(error = %e, "staging store close failed");
        }
        progress.finish();

        match &result {
            Ok(outcome) => info!(
                total_system_trx = outcome.summary.total_system_trx,
                total_matched_trx = outcome.summary.total_matched_trx,
                total_not_matched_trx = outcome.summary.total_not_matched_trx,
                "reconciliation completed"
            ),
            Err(e) => error!(error = %e, "reconciliation failed"),
        }
        result
    }

    fn run_stages<S: StagingRepository>(
        &self,
        store: &mut S,
        timestamp: i64,
        progress: &dyn Progress,
        cancel: &CancellationToken,
    ) -> ReconcileResult<ReconciliationOutcome> {
        let workers = self.config.number_worker;

        stage(STAGE_PRE, progress, cancel, || store.pre(&self.window))?;

        let data = stage(STAGE_PARSE, progress, cancel, || self.ingest())?;

        stage(STAGE_IMPORT_SYSTEM, progress, cancel, || {
            if data.system_trx.is_empty() {
                debug!("no system transactions to import");
                return Ok(());
            }
            store.import_system_trx(&data.system_trx, workers)
        })?;

        stage(STAGE_IMPORT_BANK, progress, cancel, || {
            if data.bank_trx.is_empty() {
                debug!("no bank transactions to import");
                return Ok(());
            }
            store.import_bank_trx(&data.bank_trx, workers * 2)
        })?;

        stage(STAGE_MAP, progress, cancel, || {
            if data.system_trx.is_empty() {
                debug!("no system transactions to map");
                return Ok(());
            }
            store.generate_reconciliation_map(
                data.min_system_amount,
                data.max_system_amount,
                workers * 2,
            )
        })?;

        let outcome = stage(STAGE_REPORT, progress, cancel, || {
            self.export(&*store, timestamp)
        })?;

        stage(STAGE_POST, progress, cancel, || {
            if self.config.is_debug {
                info!("debug mode, staging tables retained");
                return Ok(());
            }
            store.post()
        })?;

        Ok(outcome)
    }

    fn ingest(&self) -> ReconcileResult<TrxData> {
        Ingestor::new(
            self.fs.as_ref(),
            &self.registry,
            &self.pool,
            self.config.has_header,
        )
        .ingest(
            &self.config.system_trx_path,
            &self.config.bank_trx_path,
            &self.window,
        )
    }

    fn export<S: StagingRepository>(
        &self,
        store: &S,
        timestamp: i64,
    ) -> ReconcileResult<ReconciliationOutcome> {
        let summary = store.get_reconciliation_summary()?;
        let matched = store.get_matched_trx()?;
        let not_matched_system = store.get_not_matched_system_trx()?;
        let not_matched_bank = store.get_not_matched_bank_trx()?;

        let files = ReportWriter::new(
            self.fs.as_ref(),
            &self.pool,
            &self.config.report_trx_path,
            timestamp,
            self.config.is_delete_current_report_directory,
        )
        .write(&matched, &not_matched_system, &not_matched_bank)?;

        Ok(ReconciliationOutcome { summary, files })
    }
}

/// Checks for cancellation, reports `label`, then runs `operation`.
fn stage<T>(
    label: &'static str,
    progress: &dyn Progress,
    cancel: &CancellationToken,
    operation: impl FnOnce() -> ReconcileResult<T>,
) -> ReconcileResult<T> {
    if cancel.is_cancelled() {
        warn!(stage = label, "run cancelled before stage");
        return Err(ReconcileError::Cancelled);
    }

    progress.describe(label);
    operation().map_err(|e| {
        error!(stage = label, error = %e, "stage failed");
        ReconcileError::stage(label, e)
    })
}
