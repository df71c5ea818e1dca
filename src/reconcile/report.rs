//! CSV report export.

use crate::errors::{ReconcileError, ReconcileResult};
use crate::fs::FileSystem;
use crate::store::{MatchedTrx, NotMatchedBankTrx, NotMatchedSystemTrx};
use rayon::ThreadPool;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Report files written by one run. Empty result sets have no file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportFiles {
    pub matched_system_trx: Option<PathBuf>,
    pub not_matched_system_trx: Option<PathBuf>,
    /// Keyed by upper-case bank code.
    pub not_matched_bank_trx: BTreeMap<String, PathBuf>,
}

pub struct ReportWriter<'a> {
    fs: &'a dyn FileSystem,
    pool: &'a ThreadPool,
    root: &'a Path,
    timestamp: i64,
    clear_existing: bool,
}

impl<'a> ReportWriter<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        pool: &'a ThreadPool,
        root: &'a Path,
        timestamp: i64,
        clear_existing: bool,
    ) -> Self {
        Self {
            fs,
            pool,
            root,
            timestamp,
            clear_existing,
        }
    }

    pub fn matched_dir(&self) -> PathBuf {
        self.root.join("system").join("matched")
    }

    pub fn not_matched_system_dir(&self) -> PathBuf {
        self.root.join("system").join("not_matched")
    }

    pub fn not_matched_bank_dir(&self) -> PathBuf {
        self.root.join("bank").join("not_matched")
    }

    pub fn write(
        &self,
        matched: &[MatchedTrx],
        not_matched_system: &[NotMatchedSystemTrx],
        not_matched_bank: &[NotMatchedBankTrx],
    ) -> ReconcileResult<ReportFiles> {
        if self.clear_existing {
            for dir in [
                self.matched_dir(),
                self.not_matched_system_dir(),
                self.not_matched_bank_dir(),
            ] {
                self.fs.remove_dir_all(&dir)?;
                debug!(dir = %dir.display(), "previous reports removed");
            }
        }

        let matched_system_trx = self.write_rows(
            self.matched_dir()
                .join(format!("matched_{}.csv", self.timestamp)),
            matched,
        )?;
        let not_matched_system_trx = self.write_rows(
            self.not_matched_system_dir()
                .join(format!("not_matched_{}.csv", self.timestamp)),
            not_matched_system,
        )?;
        let not_matched_bank_trx = self.write_per_bank(not_matched_bank);

        let files = ReportFiles {
            matched_system_trx,
            not_matched_system_trx,
            not_matched_bank_trx,
        };
        info!(
            matched = ?files.matched_system_trx,
            not_matched_system = ?files.not_matched_system_trx,
            not_matched_banks = files.not_matched_bank_trx.len(),
            "reports written"
        );
        Ok(files)
    }

    /// One file per bank, written on the worker pool. A failed bank is logged
    /// and left out.
    fn write_per_bank(&self, rows: &[NotMatchedBankTrx]) -> BTreeMap<String, PathBuf> {
        let mut by_bank: BTreeMap<String, Vec<&NotMatchedBankTrx>> = BTreeMap::new();
        for row in rows {
            by_bank
                .entry(row.bank.to_ascii_uppercase())
                .or_default()
                .push(row);
        }

        let dir = self.not_matched_bank_dir();
        let written: Vec<(String, ReconcileResult<Option<PathBuf>>)> = self.pool.install(|| {
            by_bank
                .par_iter()
                .map(|(bank, rows)| {
                    let path = dir.join(format!(
                        "{}_{}.csv",
                        bank.to_ascii_lowercase(),
                        self.timestamp
                    ));
                    (bank.clone(), self.write_rows(path, rows))
                })
                .collect()
        });

        written
            .into_iter()
            .filter_map(|(bank, result)| match result {
                Ok(path) => path.map(|path| (bank, path)),
                Err(e) => {
                    error!(bank = %bank, error = %e, "bank report not written");
                    None
                }
            })
            .collect()
    }

    fn write_rows<T: Serialize>(&self, path: PathBuf, rows: &[T]) -> ReconcileResult<Option<PathBuf>> {
        if rows.is_empty() {
            return Ok(None);
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ReconcileError::Io(e.into_error()))?;

        self.fs.write(&path, &bytes)?;
        debug!(file = %path.display(), rows = rows.len(), "report written");
        Ok(Some(path))
    }
}
