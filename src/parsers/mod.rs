pub mod banks;
pub mod decode;
pub mod system;
pub mod traits;
pub mod types;

pub mod prelude {
    pub use super::banks::{BankParserFactory, CsvBankParser, DEFAULT_PARSER_KEY, ParserRegistry};
    pub use super::system::SystemParser;
    pub use super::traits::{BankColumns, BankParser, BankParserKind, BankRow};
    pub use super::types::{LedgerTime, StatementDate};
}
