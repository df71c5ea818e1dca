use crate::errors::ReconcileResult;
use crate::parsers::banks::strategy::CsvBankParser;
use crate::parsers::traits::{BankColumns, BankParser, BankParserKind, BankRow};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
pub struct BcaTrxRow {
    #[serde(rename = "BCAUniqueIdentifier")]
    pub unique_identifier: String,
    #[serde(rename = "BCADate")]
    pub date: String,
    #[serde(rename = "BCAAmount")]
    pub amount: String,
}

impl BankRow for BcaTrxRow {
    const HEADER: [&'static str; 3] = ["BCAUniqueIdentifier", "BCADate", "BCAAmount"];

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
    Ok(Box::new(CsvBankParser::<BcaTrxRow>::new(
        bank,
        BankParserKind::Bca,
        reader,
        has_header,
    )))
}
