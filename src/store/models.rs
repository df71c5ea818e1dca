use crate::parsers::types::LEDGER_TIME_FORMAT;
use crate::types::TrxType;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Aggregate view of one staged run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationSummary {
    pub total_system_trx: u64,
    pub total_matched_trx: u64,
    pub total_not_matched_trx: u64,
    pub sum_system_trx: Decimal,
    pub sum_matched_trx: Decimal,
    /// Sum of processed minus sum of matched system amounts.
    pub sum_discrepancies_trx: Decimal,
    pub total_bank_trx: u64,
    pub total_not_matched_bank_trx: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedTrx {
    #[serde(rename = "SystemTrxTrxID")]
    pub system_trx_trx_id: String,
    #[serde(rename = "BankTrxUniqueIdentifier")]
    pub bank_trx_unique_identifier: String,
    #[serde(rename = "SystemTrxTransactionTime", serialize_with = "ledger_time")]
    pub system_trx_transaction_time: NaiveDateTime,
    #[serde(rename = "BankTrxDate")]
    pub bank_trx_date: NaiveDate,
    #[serde(rename = "SystemTrxType")]
    pub system_trx_type: TrxType,
    #[serde(rename = "Bank")]
    pub bank: String,
    #[serde(rename = "SystemTrxAmount")]
    pub system_trx_amount: Decimal,
    #[serde(rename = "BankTrxAmount")]
    pub bank_trx_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotMatchedSystemTrx {
    #[serde(rename = "TrxID")]
    pub trx_id: String,
    #[serde(rename = "TransactionTime", serialize_with = "ledger_time")]
    pub transaction_time: NaiveDateTime,
    #[serde(rename = "Type")]
    pub trx_type: TrxType,
    #[serde(rename = "Amount")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotMatchedBankTrx {
    #[serde(rename = "UniqueIdentifier")]
    pub unique_identifier: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Bank")]
    pub bank: String,
    #[serde(rename = "Type")]
    pub trx_type: TrxType,
    #[serde(rename = "Amount")]
    pub amount: Decimal,
}

fn ledger_time<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format(LEDGER_TIME_FORMAT))
}
