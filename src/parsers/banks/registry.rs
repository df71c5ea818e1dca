use super::{bca, bni, default};
use crate::errors::{ReconcileError, ReconcileResult};
use crate::parsers::traits::BankParser;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

pub const DEFAULT_PARSER_KEY: &str = "DEFAULT";

/// Creates a bank parser bound to an open statement file.
pub type BankParserFactory = Arc<
    dyn Fn(&str, Box<dyn Read + Send>, bool) -> ReconcileResult<Box<dyn BankParser>> + Send + Sync,
>;

/// Bank code to parser factory lookup, with a `DEFAULT` fallback.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    factories: HashMap<String, BankParserFactory>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in BCA, BNI and default strategies.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("BCA", bca::new_parser);
        registry.register("BNI", bni::new_parser);
        registry.register(DEFAULT_PARSER_KEY, default::new_parser);
        registry
    }

    pub fn register<F>(&mut self, bank_code: &str, factory: F) -> &mut Self
    where
        F: Fn(&str, Box<dyn Read + Send>, bool) -> ReconcileResult<Box<dyn BankParser>>
            + Send
            + Sync
            + 'static,
    {
        self.factories
            .insert(canonical(bank_code), Arc::new(factory));
        self
    }

    pub fn contains(&self, bank_code: &str) -> bool {
        self.factories.contains_key(&canonical(bank_code))
    }

    /// Resolves the parser for `bank_code`: exact match first, then the
    /// `DEFAULT` factory. The returned parser is tagged with `bank_code`
    /// either way.
    pub fn get_parser(
        &self,
        bank_code: &str,
        reader: Box<dyn Read + Send>,
        has_header: bool,
    ) -> ReconcileResult<Box<dyn BankParser>> {
        let key = canonical(bank_code);
        let factory = self
            .factories
            .get(&key)
            .or_else(|| self.factories.get(DEFAULT_PARSER_KEY))
            .ok_or_else(|| ReconcileError::ParserNotFound(key.clone()))?;

        factory(&key, reader, has_header)
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut banks: Vec<&String> = self.factories.keys().collect();
        banks.sort();
        f.debug_struct("ParserRegistry").field("banks", &banks).finish()
    }
}

fn canonical(bank_code: &str) -> String {
    bank_code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::traits::BankParserKind;
    use rstest::rstest;
    use std::io::Cursor;
    use std::path::Path;

    fn empty_reader() -> Box<dyn Read + Send> {
        Box::new(Cursor::new(Vec::new()))
    }

    #[rstest]
    #[case("BCA", BankParserKind::Bca, "BCA")]
    #[case("bca", BankParserKind::Bca, "BCA")]
    #[case("BNI", BankParserKind::Bni, "BNI")]
    #[case("DEFAULT", BankParserKind::Default, "DEFAULT")]
    #[case("UNKNOWN_BANK", BankParserKind::Default, "UNKNOWN_BANK")]
    #[case("mandiri", BankParserKind::Default, "MANDIRI")]
    fn test_get_parser_resolution(
        #[case] bank: &str,
        #[case] expected_kind: BankParserKind,
        #[case] expected_bank: &str,
    ) {
        let registry = ParserRegistry::with_defaults();
        let parser = registry.get_parser(bank, empty_reader(), true).unwrap();

        assert_eq!(parser.kind(), expected_kind);
        assert_eq!(parser.bank(), expected_bank);
    }

    #[test]
    fn test_get_parser_without_default_fails() {
        let mut registry = ParserRegistry::new();
        registry.register("BCA", bca::new_parser);

        let result = registry.get_parser("UNKNOWN_BANK", empty_reader(), true);
        assert!(matches!(
            result,
            Err(ReconcileError::ParserNotFound(bank)) if bank == "UNKNOWN_BANK"
        ));
    }

    #[test]
    fn test_empty_registry_fails() {
        let result = ParserRegistry::new().get_parser("BCA", empty_reader(), true);
        assert!(result.is_err());
    }

    #[test]
    fn test_register_custom_bank() {
        let mut registry = ParserRegistry::with_defaults();
        registry.register("mandiri", bni::new_parser);

        assert!(registry.contains("MANDIRI"));
        let parser = registry.get_parser("Mandiri", empty_reader(), true).unwrap();
        assert_eq!(parser.kind(), BankParserKind::Bni);
        assert_eq!(parser.bank(), "MANDIRI");
    }

    #[test]
    fn test_fallback_parser_decodes_default_layout() {
        let registry = ParserRegistry::with_defaults();
        let content = "UniqueIdentifier,Date,Amount\nbri-1,2025-03-06,-5000\n";
        let parser = registry
            .get_parser("bri", Box::new(Cursor::new(content.as_bytes().to_vec())), true)
            .unwrap();

        let records = parser.to_bank_trx(Path::new("/bank/bri/a.csv")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bank, "BRI");
    }

    #[test]
    fn test_debug_lists_banks() {
        let debug = format!("{:?}", ParserRegistry::with_defaults());
        assert!(debug.contains("BCA"));
        assert!(debug.contains("DEFAULT"));
    }
}
