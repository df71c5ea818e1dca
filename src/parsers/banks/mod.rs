pub mod bca;
pub mod bni;
pub mod default;
pub mod registry;
pub mod strategy;

pub use registry::{BankParserFactory, DEFAULT_PARSER_KEY, ParserRegistry};
pub use strategy::CsvBankParser;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrxType;
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::io::{Cursor, Read};
    use std::path::Path;
    use std::str::FromStr;

    fn reader(content: &str) -> Box<dyn Read + Send> {
        Box::new(Cursor::new(content.as_bytes().to_vec()))
    }

    fn parse(bank: &str, content: &str, has_header: bool) -> Vec<crate::types::BankTrxRecord> {
        ParserRegistry::with_defaults()
            .get_parser(bank, reader(content), has_header)
            .unwrap()
            .to_bank_trx(Path::new("/bank/statement.csv"))
            .unwrap()
    }

    const BCA_CSV: &str = "BCAUniqueIdentifier,BCADate,BCAAmount
bca-5585fa85a971917b48ea2729bcf7d9fb,2025-03-06,41000
bca-e6f8fbe1f6f8c72da7caade610b692e8,2025-03-07,-7700
";

    const BNI_CSV: &str = "BNIUniqueIdentifier,BNIDate,BNIAmount
bni-5f4b1bdf10332ea307813ce402f3d7d4,2025-03-09,-71200
";

    #[test]
    fn test_bca_layout() {
        let records = parse("bca", BCA_CSV, true);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].unique_identifier, "bca-5585fa85a971917b48ea2729bcf7d9fb");
        assert_eq!(records[0].trx_type, TrxType::Credit);
        assert_eq!(records[1].trx_type, TrxType::Debit);
        assert_eq!(records[1].amount, Decimal::from_str("-7700").unwrap());
        assert!(records.iter().all(|r| r.bank == "BCA"));
        assert!(records.iter().all(|r| r.source_file == Path::new("/bank/statement.csv")));
    }

    #[test]
    fn test_bni_layout() {
        let records = parse("BNI", BNI_CSV, true);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].trx_type, TrxType::Debit);
        assert_eq!(records[0].bank, "BNI");
    }

    #[rstest]
    #[case("bca", "bca-1,2025-03-06,41000\nbca-2,2025-03-06,-1\n")]
    #[case("bni", "bni-1,2025-03-06,41000\nbni-2,2025-03-06,-1\n")]
    #[case("other", "x-1,2025-03-06,41000\nx-2,2025-03-06,-1\n")]
    fn test_headerless_files_use_canonical_columns(#[case] bank: &str, #[case] content: &str) {
        let records = parse(bank, content, false);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, Decimal::from(41000));
        assert_eq!(records[1].trx_type, TrxType::Debit);
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let content = "BCAUniqueIdentifier,BCADate,BCAAmount
bca-1,2025-03-06,41000
bca-2,06/03/2025,100
bca-3,2025-03-06,abc
,2025-03-06,100
bca-5,2025-03-06,-100
";
        let records = parse("bca", content, true);
        let ids: Vec<&str> = records.iter().map(|r| r.unique_identifier.as_str()).collect();
        assert_eq!(ids, vec!["bca-1", "bca-5"]);
    }

    #[test]
    fn test_wrong_layout_yields_no_records() {
        assert!(parse("bca", BNI_CSV, true).is_empty());
    }

    #[test]
    fn test_sign_invariant_holds_for_every_record() {
        let records = parse("bca", BCA_CSV, true);
        for record in records {
            assert_eq!(record.trx_type == TrxType::Debit, record.amount < Decimal::ZERO);
        }
    }
}
