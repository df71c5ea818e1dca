use crate::errors::ReconcileError;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const STATEMENT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const LEDGER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Calendar date as written in a bank statement (`YYYY-MM-DD`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementDate(String);

impl StatementDate {
    pub fn parse(&self) -> Result<NaiveDate, ReconcileError> {
        let s = self.0.trim();
        NaiveDate::parse_from_str(s, STATEMENT_DATE_FORMAT)
            .map_err(|e| ReconcileError::InvalidDate(format!("'{}': {}", s, e)))
    }
}

impl From<String> for StatementDate {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for StatementDate {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<StatementDate> for NaiveDate {
    type Error = ReconcileError;

    fn try_from(date: StatementDate) -> Result<Self, Self::Error> {
        date.parse()
    }
}

/// Ledger timestamp with second precision (`YYYY-MM-DD HH:MM:SS`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTime(String);

impl LedgerTime {
    pub fn parse(&self) -> Result<NaiveDateTime, ReconcileError> {
        let s = self.0.trim();
        NaiveDateTime::parse_from_str(s, LEDGER_TIME_FORMAT)
            .map_err(|e| ReconcileError::InvalidDate(format!("'{}': {}", s, e)))
    }
}

impl From<String> for LedgerTime {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for LedgerTime {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<LedgerTime> for NaiveDateTime {
    type Error = ReconcileError;

    fn try_from(time: LedgerTime) -> Result<Self, Self::Error> {
        time.parse()
    }
}

pub fn parse_amount(raw: &str) -> Result<Decimal, ReconcileError> {
    let s = raw.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|e| ReconcileError::InvalidAmount(format!("'{}': {}", s, e)))
}
