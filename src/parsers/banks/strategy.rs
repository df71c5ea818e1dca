use crate::errors::ReconcileResult;
use crate::parsers::decode::decode_rows;
use crate::parsers::traits::{BankParser, BankParserKind, BankRow};
use crate::parsers::types::{StatementDate, parse_amount};
use crate::types::BankTrxRecord;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;

/// Bank parser for any layout described by a [`BankRow`].
pub struct CsvBankParser<R> {
    bank: String,
    kind: BankParserKind,
    reader: Box<dyn Read + Send>,
    has_header: bool,
    _row: PhantomData<fn() -> R>,
}

impl<R: BankRow> CsvBankParser<R> {
    pub fn new(
        bank: &str,
        kind: BankParserKind,
        reader: Box<dyn Read + Send>,
        has_header: bool,
    ) -> Self {
        Self {
            bank: bank.trim().to_ascii_uppercase(),
            kind,
            reader,
            has_header,
            _row: PhantomData,
        }
    }
}

impl<R: BankRow> BankParser for CsvBankParser<R> {
    fn bank(&self) -> &str {
        &self.bank
    }

    fn kind(&self) -> BankParserKind {
        self.kind
    }

    fn to_bank_trx(self: Box<Self>, source_file: &Path) -> ReconcileResult<Vec<BankTrxRecord>> {
        let this = *self;
        let bank = this.bank;

        decode_rows::<R, _, _>(
            this.reader,
            this.has_header,
            &R::HEADER,
            source_file,
            |row| {
                let columns = row.into_columns();
                if columns.unique_identifier.is_empty() {
                    return Err("missing unique identifier".to_string());
                }

                let date = StatementDate::from(columns.date)
                    .parse()
                    .map_err(|e| e.to_string())?;
                let amount = parse_amount(&columns.amount).map_err(|e| e.to_string())?;

                Ok(BankTrxRecord::new(
                    columns.unique_identifier,
                    date,
                    amount,
                    &bank,
                    source_file,
                ))
            },
        )
    }
}
