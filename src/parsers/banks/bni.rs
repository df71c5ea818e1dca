use crate::errors::ReconcileResult;
use crate::parsers::banks::strategy::CsvBankParser;
use crate::parsers::traits::{BankColumns, BankParser, BankParserKind, BankRow};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
pub struct BniTrxRow {
    #[serde(rename = "BNIUniqueIdentifier")]
    pub unique_identifier: String,
    #[serde(rename = "BNIDate")]
    pub date: String,
    #[serde(rename = "BNIAmount")]
    pub amount: String,
}

impl BankRow for BniTrxRow {
    const HEADER: [&'static str; 3] = ["BNIUniqueIdentifier", "BNIDate", "BNIAmount"];

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
    Ok(Box::new(CsvBankParser::<BniTrxRow>::new(
        bank,
        BankParserKind::Bni,
        reader,
        has_header,
    )))
}
