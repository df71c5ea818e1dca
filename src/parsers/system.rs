use crate::errors::ReconcileResult;
use crate::parsers::decode::decode_rows;
use crate::parsers::types::{LedgerTime, parse_amount};
use crate::types::{SystemTrxRecord, TrxType};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

pub const SYSTEM_HEADER: [&str; 4] = ["TrxID", "TransactionTime", "Type", "Amount"];

#[derive(Debug, Deserialize)]
pub struct SystemTrxRaw {
    #[serde(rename = "TrxID")]
    pub trx_id: String,
    #[serde(rename = "TransactionTime")]
    pub transaction_time: String,
    #[serde(rename = "Type")]
    pub trx_type: String,
    #[serde(rename = "Amount")]
    pub amount: String,
}

impl SystemTrxRaw {
    fn into_record(self, source_file: &Path) -> Result<SystemTrxRecord, String> {
        if self.trx_id.is_empty() {
            return Err("missing TrxID".to_string());
        }

        let transaction_time = LedgerTime::from(self.transaction_time)
            .parse()
            .map_err(|e| e.to_string())?;
        let trx_type = self
            .trx_type
            .parse::<TrxType>()
            .map_err(|e| e.to_string())?;
        let amount = parse_amount(&self.amount).map_err(|e| e.to_string())?;

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(format!("negative system amount {}", amount));
        }

        Ok(SystemTrxRecord {
            trx_id: self.trx_id,
            transaction_time,
            trx_type,
            amount,
            source_file: source_file.to_path_buf(),
        })
    }
}

/// Decoder for the internal ledger export.
pub struct SystemParser {
    reader: Box<dyn Read + Send>,
    has_header: bool,
}

impl SystemParser {
    pub fn new(reader: Box<dyn Read + Send>, has_header: bool) -> Self {
        Self { reader, has_header }
    }

    pub fn to_system_trx(self, source_file: &Path) -> ReconcileResult<Vec<SystemTrxRecord>> {
        decode_rows::<SystemTrxRaw, _, _>(
            self.reader,
            self.has_header,
            &SYSTEM_HEADER,
            source_file,
            |raw| raw.into_record(source_file),
        )
    }
}
