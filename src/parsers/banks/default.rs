use crate::errors::ReconcileResult;
use crate::parsers::banks::strategy::CsvBankParser;
use crate::parsers::traits::{BankColumns, BankParser, BankParserKind, BankRow};
use serde::Deserialize;
use std::io::Read;

/// Layout used for any bank without a dedicated strategy.
#[derive(Debug, Deserialize)]
pub struct DefaultTrxRow {
    #[serde(rename = "UniqueIdentifier")]
    pub unique_identifier: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Amount")]
    pub amount: String,
}

impl BankRow for DefaultTrxRow {
    const HEADER: [&'static str; 3] = ["UniqueIdentifier", "Date", "Amount"];

    fn into_columns(self) -> BankColumns {
        BankColumns {
            unique_identifier: self.unique_identifier,
            date: self.date,
            amount: self.amount,
        }
    }
}

pub fn new_parser(
    bank: &str,
    reader: Box<dyn Read + Send>,
    has_header: bool,
) -> ReconcileResult<Box<dyn BankParser>> {
    Ok(Box::new(CsvBankParser::<DefaultTrxRow>::new(
        bank,
        BankParserKind::Default,
        reader,
        has_header,
    )))
}
