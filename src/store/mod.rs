//! Staging store: an embedded SQLite database used as scratch space for
//! one reconciliation run.
//!
//! SQLite allows a single writer at a time, so writes are issued as
//! sequential, bounded transactions: one per import chunk and one per amount
//! bucket. A crash loses at most the chunk in flight.

pub mod models;
pub mod partition;
pub mod queries;

pub use models::{MatchedTrx, NotMatchedBankTrx, NotMatchedSystemTrx, ReconciliationSummary};

use crate::errors::{ReconcileError, ReconcileResult};
use crate::parsers::types::{LEDGER_TIME_FORMAT, STATEMENT_DATE_FORMAT};
use crate::types::{BankTrxRecord, ReconciliationWindow, SystemTrxRecord, TrxType};
use chrono::{NaiveDate, NaiveDateTime};
use num_traits::ToPrimitive;
use partition::{amount_buckets, index_ranges};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, Transaction, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

const STATEMENT_CACHE_CAPACITY: usize = 32;

/// Operations the reconciliation pipeline needs from a staging backend.
pub trait StagingRepository {
    /// Drops leftovers of a previous run and creates fresh staging tables
    /// scoped to `window`.
    fn pre(&mut self, window: &ReconciliationWindow) -> ReconcileResult<()>;

    fn import_system_trx(&mut self, records: &[SystemTrxRecord], chunks: usize)
    -> ReconcileResult<()>;

    fn import_bank_trx(&mut self, records: &[BankTrxRecord], chunks: usize) -> ReconcileResult<()>;

    /// Builds the match map over `[min_amount, max_amount]`, one transaction
    /// per amount bucket.
    fn generate_reconciliation_map(
        &mut self,
        min_amount: Decimal,
        max_amount: Decimal,
        buckets: usize,
    ) -> ReconcileResult<()>;

    fn get_reconciliation_summary(&self) -> ReconcileResult<ReconciliationSummary>;

    fn get_matched_trx(&self) -> ReconcileResult<Vec<MatchedTrx>>;

    fn get_not_matched_system_trx(&self) -> ReconcileResult<Vec<NotMatchedSystemTrx>>;

    fn get_not_matched_bank_trx(&self) -> ReconcileResult<Vec<NotMatchedBankTrx>>;

    /// Drops every staging table.
    fn post(&mut self) -> ReconcileResult<()>;

    fn close(self) -> ReconcileResult<()>
    where
        Self: Sized;
}

pub struct StagingStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl StagingStore {
    /// Opens (or creates) the staging database at `path`.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn open(path: &Path) -> ReconcileResult<Self> {
        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "staging store opened");
        Ok(Self::with_connection(conn, Some(path.to_path_buf())))
    }

    pub fn open_in_memory() -> ReconcileResult<Self> {
        Ok(Self::with_connection(Connection::open_in_memory()?, None))
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Self {
        conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);
        Self { conn, path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True when every staging table exists.
    pub fn is_prepared(&self) -> ReconcileResult<bool> {
        let count: i64 = self
            .conn
            .prepare_cached(queries::COUNT_STAGING_TABLES)?
            .query_row([], |row| row.get(0))?;
        Ok(count == 5)
    }

    /// Runs `operation` in its own transaction: commit on success, rollback
    /// on error.
    fn with_transaction<T>(
        &mut self,
        operation: &str,
        f: impl FnOnce(&Transaction<'_>) -> ReconcileResult<T>,
    ) -> ReconcileResult<T> {
        let tx = self.conn.transaction()?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                debug!(operation, "transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback() {
                    warn!(operation, error = %rollback, "rollback failed");
                }
                error!(operation, error = %e, "transaction rolled back");
                Err(e)
            }
        }
    }

    fn import_chunks<'r, T, S>(
        &mut self,
        operation: &str,
        query: &str,
        records: &'r [T],
        chunks: usize,
        stage: impl Fn(&'r T) -> ReconcileResult<S>,
    ) -> ReconcileResult<()>
    where
        S: Serialize,
    {
        for range in index_ranges(records.len(), chunks) {
            let rows = records
                .get(range.clone())
                .unwrap_or_default()
                .iter()
                .map(&stage)
                .collect::<ReconcileResult<Vec<S>>>()?;
            let payload = serde_json::to_string(&rows)?;

            let label = format!("{} ({} - {})", operation, range.start, range.end);
            let inserted = self.with_transaction(&label, |tx| {
                Ok(tx.prepare_cached(query)?.execute(params![payload])?)
            })?;
            debug!(operation, from = range.start, to = range.end, inserted, "chunk imported");
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct StagedSystemTrx<'a> {
    trx_id: &'a str,
    transaction_time: String,
    trx_date: String,
    trx_type: &'static str,
    amount: String,
    amount_value: f64,
    source_file: String,
}

impl<'a> StagedSystemTrx<'a> {
    fn from_record(record: &'a SystemTrxRecord) -> ReconcileResult<Self> {
        Ok(Self {
            trx_id: &record.trx_id,
            transaction_time: record.transaction_time.format(LEDGER_TIME_FORMAT).to_string(),
            trx_date: record.date().format(STATEMENT_DATE_FORMAT).to_string(),
            trx_type: record.trx_type.as_str(),
            amount: record.amount.to_string(),
            amount_value: to_real(record.amount)?,
            source_file: record.source_file.to_string_lossy().into_owned(),
        })
    }
}

#[derive(Serialize)]
struct StagedBankTrx<'a> {
    unique_identifier: &'a str,
    bank: &'a str,
    trx_date: String,
    trx_type: &'static str,
    amount: String,
    amount_value: f64,
    source_file: String,
}

impl<'a> StagedBankTrx<'a> {
    fn from_record(record: &'a BankTrxRecord) -> ReconcileResult<Self> {
        Ok(Self {
            unique_identifier: &record.unique_identifier,
            bank: &record.bank,
            trx_date: record.date.format(STATEMENT_DATE_FORMAT).to_string(),
            trx_type: record.trx_type.as_str(),
            amount: record.amount.to_string(),
            amount_value: to_real(record.amount)?,
            source_file: record.source_file.to_string_lossy().into_owned(),
        })
    }
}

impl StagingRepository for StagingStore {
    #[instrument(skip(self, window), fields(from = %window.from_date, to = %window.to_date))]
    fn pre(&mut self, window: &ReconciliationWindow) -> ReconcileResult<()> {
        let banks = serde_json::to_string(&window.accepted_banks)?;
        let from_date = window.from_date.format(STATEMENT_DATE_FORMAT).to_string();
        let to_date = window.to_date.format(STATEMENT_DATE_FORMAT).to_string();

        self.with_transaction("pre", |tx| {
            tx.execute_batch(queries::DROP_TABLES)?;
            tx.execute_batch(queries::CREATE_TABLES)?;
            tx.prepare_cached(queries::INSERT_ARGUMENTS)?
                .execute(params![from_date, to_date])?;
            tx.prepare_cached(queries::INSERT_BANKS)?
                .execute(params![banks])?;
            Ok(())
        })?;

        info!("staging tables prepared");
        Ok(())
    }

    #[instrument(skip(self, records), fields(records = records.len()))]
    fn import_system_trx(
        &mut self,
        records: &[SystemTrxRecord],
        chunks: usize,
    ) -> ReconcileResult<()> {
        self.import_chunks(
            "import_system_trx",
            queries::INSERT_SYSTEM_TRX,
            records,
            chunks,
            StagedSystemTrx::from_record,
        )
    }

    #[instrument(skip(self, records), fields(records = records.len()))]
    fn import_bank_trx(&mut self, records: &[BankTrxRecord], chunks: usize) -> ReconcileResult<()> {
        self.import_chunks(
            "import_bank_trx",
            queries::INSERT_BANK_TRX,
            records,
            chunks,
            StagedBankTrx::from_record,
        )
    }

    #[instrument(skip(self))]
    fn generate_reconciliation_map(
        &mut self,
        min_amount: Decimal,
        max_amount: Decimal,
        buckets: usize,
    ) -> ReconcileResult<()> {
        let min = to_real(min_amount)?;
        let max = to_real(max_amount)?;

        for bucket in amount_buckets(min, max, buckets) {
            let label = format!(
                "generate_reconciliation_map ({:.2} - {:.2})",
                bucket.lower, bucket.upper
            );
            let paired = self.with_transaction(&label, |tx| {
                Ok(tx
                    .prepare_cached(queries::INSERT_RECONCILIATION_MAP)?
                    .execute(params![bucket.lower, bucket.upper])?)
            })?;
            debug!(lower = bucket.lower, upper = bucket.upper, paired, "bucket mapped");
        }
        Ok(())
    }

    fn get_reconciliation_summary(&self) -> ReconcileResult<ReconciliationSummary> {
        let mut stmt = self.conn.prepare_cached(queries::GET_RECONCILIATION_SUMMARY)?;
        let mut summary = stmt.query_row([], |row| {
            Ok(ReconciliationSummary {
                total_system_trx: count_column(row, 0)?,
                total_matched_trx: count_column(row, 1)?,
                total_not_matched_trx: count_column(row, 2)?,
                total_bank_trx: count_column(row, 3)?,
                total_not_matched_bank_trx: count_column(row, 4)?,
                ..ReconciliationSummary::default()
            })
        })?;

        // Sums come from the exact amount text, never the REAL column.
        let mut stmt = self.conn.prepare_cached(queries::GET_SYSTEM_AMOUNTS)?;
        let amounts = stmt.query_map([], |row| {
            Ok((decimal_column(row, 0)?, row.get::<_, bool>(1)?))
        })?;
        for amount in amounts {
            let (amount, is_matched) = amount?;
            add_amount(&mut summary.sum_system_trx, amount)?;
            if is_matched {
                add_amount(&mut summary.sum_matched_trx, amount)?;
            } else {
                add_amount(&mut summary.sum_discrepancies_trx, amount)?;
            }
        }
        Ok(summary)
    }

    fn get_matched_trx(&self) -> ReconcileResult<Vec<MatchedTrx>> {
        let mut stmt = self.conn.prepare_cached(queries::GET_MATCHED_TRX)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MatchedTrx {
                    system_trx_trx_id: row.get(0)?,
                    bank_trx_unique_identifier: row.get(1)?,
                    system_trx_transaction_time: time_column(row, 2)?,
                    bank_trx_date: date_column(row, 3)?,
                    system_trx_type: type_column(row, 4)?,
                    bank: row.get(5)?,
                    system_trx_amount: decimal_column(row, 6)?,
                    bank_trx_amount: decimal_column(row, 7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_not_matched_system_trx(&self) -> ReconcileResult<Vec<NotMatchedSystemTrx>> {
        let mut stmt = self.conn.prepare_cached(queries::GET_NOT_MATCHED_SYSTEM_TRX)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(NotMatchedSystemTrx {
                    trx_id: row.get(0)?,
                    transaction_time: time_column(row, 1)?,
                    trx_type: type_column(row, 2)?,
                    amount: decimal_column(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_not_matched_bank_trx(&self) -> ReconcileResult<Vec<NotMatchedBankTrx>> {
        let mut stmt = self.conn.prepare_cached(queries::GET_NOT_MATCHED_BANK_TRX)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(NotMatchedBankTrx {
                    unique_identifier: row.get(0)?,
                    date: date_column(row, 1)?,
                    bank: row.get(2)?,
                    trx_type: type_column(row, 3)?,
                    amount: decimal_column(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    fn post(&mut self) -> ReconcileResult<()> {
        self.with_transaction("post", |tx| {
            tx.execute_batch(queries::DROP_TABLES)?;
            Ok(())
        })?;
        // Cached statements refer to the dropped tables.
        self.conn.flush_prepared_statement_cache();
        info!("staging tables dropped");
        Ok(())
    }

    fn close(self) -> ReconcileResult<()> {
        self.conn.close().map_err(|(_, e)| ReconcileError::from(e))
    }
}

fn to_real(amount: Decimal) -> ReconcileResult<f64> {
    amount
        .to_f64()
        .ok_or_else(|| ReconcileError::InvalidAmount(amount.to_string()))
}

fn add_amount(total: &mut Decimal, amount: Decimal) -> ReconcileResult<()> {
    *total = total
        .checked_add(amount)
        .ok_or_else(|| ReconcileError::InvalidAmount(format!("sum overflow at {}", amount)))?;
    Ok(())
}

fn conversion_error(index: usize, err: ReconcileError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn count_column(row: &Row<'_>, index: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(index)?;
    u64::try_from(value).map_err(|_| {
        conversion_error(index, ReconcileError::InvalidAmount(value.to_string()))
    })
}

fn decimal_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Decimal> {
    let value: String = row.get(index)?;
    crate::parsers::types::parse_amount(&value).map_err(|e| conversion_error(index, e))
}

fn date_column(row: &Row<'_>, index: usize) -> rusqlite::Result<NaiveDate> {
    let value: String = row.get(index)?;
    NaiveDate::parse_from_str(&value, STATEMENT_DATE_FORMAT)
        .map_err(|e| conversion_error(index, ReconcileError::InvalidDate(e.to_string())))
}

fn time_column(row: &Row<'_>, index: usize) -> rusqlite::Result<NaiveDateTime> {
    let value: String = row.get(index)?;
    NaiveDateTime::parse_from_str(&value, LEDGER_TIME_FORMAT)
        .map_err(|e| conversion_error(index, ReconcileError::InvalidDate(e.to_string())))
}

fn type_column(row: &Row<'_>, index: usize) -> rusqlite::Result<TrxType> {
    let value: String = row.get(index)?;
    value
        .parse::<TrxType>()
        .map_err(|e| conversion_error(index, e))
}
