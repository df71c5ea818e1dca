//! Concurrent parsing of the discovered input files.

use super::discovery::{BankFile, discover_bank_files, discover_system_files};
use crate::errors::{ReconcileError, ReconcileResult};
use crate::fs::FileSystem;
use crate::parsers::banks::ParserRegistry;
use crate::parsers::system::SystemParser;
use crate::types::{BankTrxRecord, ReconciliationWindow, SystemTrxRecord, TrxData};
use rayon::{ThreadPool, ThreadPoolBuilder};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Bounded pool shared by ingestion and report export.
pub fn build_worker_pool(workers: usize) -> ReconcileResult<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("reconcile-worker-{}", i))
        .build()
        .map_err(|e| ReconcileError::Config(format!("worker pool: {}", e)))
}

pub struct Ingestor<'a> {
    fs: &'a dyn FileSystem,
    registry: &'a ParserRegistry,
    pool: &'a ThreadPool,
    has_header: bool,
}

impl<'a> Ingestor<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        registry: &'a ParserRegistry,
        pool: &'a ThreadPool,
        has_header: bool,
    ) -> Self {
        Self {
            fs,
            registry,
            pool,
            has_header,
        }
    }

    /// Parses every system and bank file and keeps the records inside
    /// `window`. Files that fail are logged and contribute nothing.
    pub fn ingest(
        &self,
        system_root: &Path,
        bank_root: &Path,
        window: &ReconciliationWindow,
    ) -> ReconcileResult<TrxData> {
        let system_files = discover_system_files(self.fs, system_root)?;
        let bank_files = discover_bank_files(self.fs, bank_root, window)?;

        let (system_trx, bank_trx) = self.pool.install(|| {
            rayon::join(
                || self.parse_all(&system_files, |path| self.parse_system_file(path)),
                || self.parse_all(&bank_files, |file| self.parse_bank_file(file)),
            )
        });

        let data = filter_to_window(system_trx, bank_trx, window);
        info!(
            system_files = system_files.len(),
            bank_files = bank_files.len(),
            system_trx = data.system_trx.len(),
            bank_trx = data.bank_trx.len(),
            "input files parsed"
        );
        Ok(data)
    }

    /// Runs `parse` for every file on the pool. Output keeps file order.
    fn parse_all<F, T, P>(&self, files: &[F], parse: P) -> Vec<T>
    where
        F: Sync,
        T: Send,
        P: Fn(&F) -> ReconcileResult<Vec<T>> + Sync,
    {
        let results: Mutex<Vec<(usize, Vec<T>)>> = Mutex::new(Vec::with_capacity(files.len()));

        rayon::scope(|scope| {
            for (index, file) in files.iter().enumerate() {
                let results = &results;
                let parse = &parse;
                scope.spawn(move |_| {
                    if let Ok(records) = parse(file) {
                        results
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .push((index, records));
                    }
                });
            }
        });

        let mut results = results
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().flat_map(|(_, records)| records).collect()
    }

    fn parse_system_file(&self, path: &Path) -> ReconcileResult<Vec<SystemTrxRecord>> {
        let parsed = self
            .fs
            .open(path)
            .map_err(ReconcileError::from)
            .and_then(|reader| SystemParser::new(reader, self.has_header).to_system_trx(path));

        match parsed {
            Ok(records) => {
                debug!(file = %path.display(), records = records.len(), "system file parsed");
                Ok(records)
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "system file skipped");
                Err(e)
            }
        }
    }

    fn parse_bank_file(&self, file: &BankFile) -> ReconcileResult<Vec<BankTrxRecord>> {
        let parsed = self
            .fs
            .open(&file.path)
            .map_err(ReconcileError::from)
            .and_then(|reader| self.registry.get_parser(&file.bank, reader, self.has_header))
            .and_then(|parser| parser.to_bank_trx(&file.path));

        match parsed {
            Ok(records) => {
                debug!(
                    file = %file.path.display(),
                    bank = %file.bank,
                    records = records.len(),
                    "bank file parsed"
                );
                Ok(records)
            }
            Err(e) => {
                warn!(file = %file.path.display(), bank = %file.bank, error = %e, "bank file skipped");
                Err(e)
            }
        }
    }
}

fn filter_to_window(
    system_trx: Vec<SystemTrxRecord>,
    bank_trx: Vec<BankTrxRecord>,
    window: &ReconciliationWindow,
) -> TrxData {
    let mut max_system_amount = Decimal::ZERO;
    let system_trx: Vec<SystemTrxRecord> = system_trx
        .into_iter()
        .filter(|record| window.contains_time(record.transaction_time))
        .inspect(|record| max_system_amount = max_system_amount.max(record.amount))
        .collect();

    let bank_trx = bank_trx
        .into_iter()
        .filter(|record| window.contains_date(record.date) && window.accepts_bank(&record.bank))
        .collect();

    TrxData {
        system_trx,
        bank_trx,
        min_system_amount: Decimal::ZERO,
        max_system_amount,
    }
}
