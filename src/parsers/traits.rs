use crate::errors::ReconcileResult;
use crate::types::BankTrxRecord;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BankParserKind {
    Bca,
    Bni,
    Default,
}

impl BankParserKind {
    pub fn code(&self) -> &'static str {
        match self {
            BankParserKind::Bca => "BCA",
            BankParserKind::Bni => "BNI",
            BankParserKind::Default => "DEFAULT",
        }
    }
}

impl fmt::Display for BankParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A bank statement decoder bound to one open file.
pub trait BankParser: Send {
    /// Canonical (upper-case) bank code the records get stamped with.
    fn bank(&self) -> &str;

    fn kind(&self) -> BankParserKind;

    fn to_bank_trx(self: Box<Self>, source_file: &Path) -> ReconcileResult<Vec<BankTrxRecord>>;
}

/// The three raw columns every bank layout carries, still undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankColumns {
    pub unique_identifier: String,
    pub date: String,
    pub amount: String,
}

/// Column mapping of one bank's CSV layout.
pub trait BankRow: DeserializeOwned {
    /// Column names in file order; used as the header of headerless files.
    const HEADER: [&'static str; 3];

    fn into_columns(self) -> BankColumns;
}
