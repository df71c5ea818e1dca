use crate::errors::ReconcileError;
use chrono::{Days, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrxType {
    Debit,
    Credit,
}

impl TrxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrxType::Debit => "DEBIT",
            TrxType::Credit => "CREDIT",
        }
    }

    /// Bank statements carry direction in the sign of the amount.
    pub fn from_signed_amount(amount: Decimal) -> Self {
        if amount.is_sign_negative() && !amount.is_zero() {
            TrxType::Debit
        } else {
            TrxType::Credit
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            TrxType::Debit => TrxType::Credit,
            TrxType::Credit => TrxType::Debit,
        }
    }
}

impl fmt::Display for TrxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrxType {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBIT" => Ok(TrxType::Debit),
            "CREDIT" => Ok(TrxType::Credit),
            _ => Err(ReconcileError::InvalidTrxType(s.to_string())),
        }
    }
}

/// One entry of the internal ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemTrxRecord {
    pub trx_id: String,
    pub transaction_time: NaiveDateTime,
    pub trx_type: TrxType,
    /// Always non-negative; direction lives in `trx_type`.
    pub amount: Decimal,
    pub source_file: PathBuf,
}

impl SystemTrxRecord {
    pub fn date(&self) -> NaiveDate {
        self.transaction_time.date()
    }
}

/// One bank statement line, already tagged with its bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTrxRecord {
    pub unique_identifier: String,
    pub date: NaiveDate,
    pub trx_type: TrxType,
    pub bank: String,
    /// Signed: negative is an outflow (DEBIT), positive an inflow (CREDIT).
    pub amount: Decimal,
    pub source_file: PathBuf,
}

impl BankTrxRecord {
    /// Builds a record, deriving `trx_type` from the sign of `amount` and
    /// canonicalising `bank` to upper case.
    pub fn new(
        unique_identifier: impl Into<String>,
        date: NaiveDate,
        amount: Decimal,
        bank: &str,
        source_file: impl Into<PathBuf>,
    ) -> Self {
        BankTrxRecord {
            unique_identifier: unique_identifier.into(),
            date,
            trx_type: TrxType::from_signed_amount(amount),
            bank: bank.to_ascii_uppercase(),
            amount,
            source_file: source_file.into(),
        }
    }

    pub fn abs_amount(&self) -> Decimal {
        self.amount.abs()
    }
}

/// Immutable scope of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationWindow {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub accepted_banks: Vec<String>,
}

impl ReconciliationWindow {
    pub fn new(
        from_date: NaiveDate,
        to_date: NaiveDate,
        accepted_banks: Vec<String>,
    ) -> Result<Self, ReconcileError> {
        if from_date > to_date {
            return Err(ReconcileError::Config(format!(
                "from_date {} is after to_date {}",
                from_date, to_date
            )));
        }

        Ok(Self {
            from_date,
            to_date,
            accepted_banks,
        })
    }

    /// Exclusive upper bound: the day after `to_date`, so the whole of
    /// `to_date` is inside the window.
    fn end_exclusive(&self) -> NaiveDateTime {
        self.to_date
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
            .and_hms_opt(0, 0, 0)
            .unwrap_or(NaiveDateTime::MAX)
    }

    fn start(&self) -> NaiveDateTime {
        self.from_date.and_time(chrono::NaiveTime::MIN)
    }

    pub fn contains_time(&self, time: NaiveDateTime) -> bool {
        time >= self.start() && time < self.end_exclusive()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains_time(date.and_time(chrono::NaiveTime::MIN))
    }

    pub fn accepts_bank(&self, bank: &str) -> bool {
        self.accepted_banks
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(bank))
    }
}

/// Ingested, window-filtered input of one run.
#[derive(Debug, Clone, Default)]
pub struct TrxData {
    pub system_trx: Vec<SystemTrxRecord>,
    pub bank_trx: Vec<BankTrxRecord>,
    pub min_system_amount: Decimal,
    pub max_system_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window() -> ReconciliationWindow {
        ReconciliationWindow::new(date(2025, 3, 1), date(2025, 3, 6), vec!["bca".into()]).unwrap()
    }

    #[rstest]
    #[case("-41000", TrxType::Debit)]
    #[case("41000", TrxType::Credit)]
    #[case("-0.01", TrxType::Debit)]
    #[case("0", TrxType::Credit)]
    fn test_bank_record_type_follows_sign(#[case] amount: &str, #[case] expected: TrxType) {
        let record = BankTrxRecord::new(
            "BCA-1",
            date(2025, 3, 6),
            Decimal::from_str(amount).unwrap(),
            "bca",
            "/bank/bca/a.csv",
        );

        assert_eq!(record.trx_type, expected);
        assert_eq!(record.bank, "BCA");
        assert_eq!(record.trx_type == TrxType::Debit, record.amount < Decimal::ZERO);
    }

    #[rstest]
    #[case("DEBIT", TrxType::Debit)]
    #[case("credit", TrxType::Credit)]
    #[case(" Debit ", TrxType::Debit)]
    fn test_trx_type_from_str(#[case] input: &str, #[case] expected: TrxType) {
        assert_eq!(input.parse::<TrxType>().unwrap(), expected);
    }

    #[test]
    fn test_trx_type_rejects_unknown() {
        assert!(matches!(
            "TRANSFER".parse::<TrxType>(),
            Err(ReconcileError::InvalidTrxType(_))
        ));
    }

    #[test]
    fn test_trx_type_serialization() {
        let json = serde_json::to_string(&TrxType::Debit).unwrap();
        assert_eq!(json, "\"DEBIT\"");
        assert_eq!(TrxType::Debit.opposite(), TrxType::Credit);
    }

    #[rstest]
    #[case(date(2025, 2, 28), false)]
    #[case(date(2025, 3, 1), true)]
    #[case(date(2025, 3, 6), true)]
    #[case(date(2025, 3, 7), false)]
    fn test_window_contains_date(#[case] input: NaiveDate, #[case] expected: bool) {
        assert_eq!(window().contains_date(input), expected);
    }

    #[test]
    fn test_window_includes_whole_last_day() {
        let late = date(2025, 3, 6).and_hms_opt(23, 59, 59).unwrap();
        let next = date(2025, 3, 7).and_hms_opt(0, 0, 0).unwrap();

        assert!(window().contains_time(late));
        assert!(!window().contains_time(next));
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let result = ReconciliationWindow::new(date(2025, 3, 6), date(2025, 3, 1), vec![]);
        assert!(matches!(result, Err(ReconcileError::Config(_))));
    }

    #[test]
    fn test_window_accepts_bank_case_insensitively() {
        assert!(window().accepts_bank("BCA"));
        assert!(!window().accepts_bank("bni"));
    }
}
