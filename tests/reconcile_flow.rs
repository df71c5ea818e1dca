use bank_reconcile::{
    CancellationToken, FileSystem, MemoryFileSystem, NoProgress, OsFileSystem, ParserRegistry,
    ReconcileConfig, Reconciler, StagingStore,
};
use chrono::NaiveDate;
use rstest::rstest;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

const TIMESTAMP: i64 = 1741280961;

const SYSTEM_CSV: &str = "TrxID,TransactionTime,Type,Amount\n\
    T1,2025-03-06 17:09:21,DEBIT,41000\n\
    T2,2025-03-06 18:00:00,CREDIT,150000\n\
    T3,2025-03-07 08:15:00,DEBIT,72500.25\n\
    T4,2025-03-08 09:00:00,CREDIT,10\n\
    T5,2025-04-01 09:00:00,DEBIT,41000\n";

const BCA_CSV: &str = "BCAUniqueIdentifier,BCADate,BCAAmount\n\
    BCA-1,2025-03-06,41000\n\
    BCA-2,2025-03-06,-150000\n\
    BCA-3,2025-03-07,-72500.25\n";

const BNI_CSV: &str = "BNIUniqueIdentifier,BNIDate,BNIAmount\n\
    BNI-1,2025-03-07,72500.25\n\
    BNI-2,2025-03-09,999\n";

fn config(root: &Path, is_debug: bool) -> ReconcileConfig {
    ReconcileConfig {
        system_trx_path: root.join("system"),
        bank_trx_path: root.join("bank"),
        report_trx_path: root.join("report"),
        list_bank: vec!["bca".to_string(), "bni".to_string()],
        from_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        to_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        number_worker: 3,
        has_header: true,
        is_debug,
        is_delete_current_report_directory: true,
        db_path: root.join("reconcile.db"),
        log_level: "info".to_string(),
    }
}

fn seed(fs: &dyn FileSystem, root: &Path) {
    fs.write(&root.join("system/ledger.csv"), SYSTEM_CSV.as_bytes())
        .unwrap();
    fs.write(&root.join("bank/bca/march.csv"), BCA_CSV.as_bytes())
        .unwrap();
    fs.write(&root.join("bank/bni/march.csv"), BNI_CSV.as_bytes())
        .unwrap();
    fs.write(
        &root.join("bank/mandiri/march.csv"),
        b"UniqueIdentifier,Date,Amount\nMDR-1,2025-03-08,-10\n",
    )
    .unwrap();
}

#[test]
fn test_full_run_in_memory() {
    let root = Path::new("/data");
    let fs = MemoryFileSystem::new();
    seed(&fs, root);
    fs.insert("/data/report/system/matched/matched_1.csv", "stale");

    let outcome = Reconciler::new(config(root, false), ParserRegistry::with_defaults(), fs.clone())
        .unwrap()
        .with_run_timestamp(TIMESTAMP)
        .run(
            StagingStore::open_in_memory().unwrap(),
            &NoProgress,
            &CancellationToken::new(),
        )
        .unwrap();

    let summary = &outcome.summary;
    assert_eq!(summary.total_system_trx, 4);
    assert_eq!(summary.total_matched_trx, 3);
    assert_eq!(summary.total_not_matched_trx, 1);
    assert_eq!(summary.sum_system_trx, Decimal::new(26351025, 2));
    assert_eq!(summary.sum_discrepancies_trx, Decimal::from(10));
    assert_eq!(summary.total_bank_trx, 5);
    assert_eq!(summary.total_not_matched_bank_trx, 2);

    let matched = fs
        .read_to_string(&root.join(format!("report/system/matched/matched_{}.csv", TIMESTAMP)))
        .unwrap();
    assert_eq!(
        matched,
        "SystemTrxTrxID,BankTrxUniqueIdentifier,SystemTrxTransactionTime,BankTrxDate,SystemTrxType,Bank,SystemTrxAmount,BankTrxAmount\n\
         T1,BCA-1,2025-03-06 17:09:21,2025-03-06,DEBIT,BCA,41000,41000\n\
         T2,BCA-2,2025-03-06 18:00:00,2025-03-06,CREDIT,BCA,150000,-150000\n\
         T3,BNI-1,2025-03-07 08:15:00,2025-03-07,DEBIT,BNI,72500.25,72500.25\n"
    );
    assert!(!fs.exists(Path::new("/data/report/system/matched/matched_1.csv")));

    let not_matched_system = fs
        .read_to_string(&root.join(format!(
            "report/system/not_matched/not_matched_{}.csv",
            TIMESTAMP
        )))
        .unwrap();
    assert_eq!(
        not_matched_system,
        "TrxID,TransactionTime,Type,Amount\nT4,2025-03-08 09:00:00,CREDIT,10\n"
    );

    assert_eq!(
        outcome.files.not_matched_bank_trx.keys().collect::<Vec<_>>(),
        vec!["BCA", "BNI"]
    );
    let bca = fs
        .read_to_string(&root.join(format!("report/bank/not_matched/bca_{}.csv", TIMESTAMP)))
        .unwrap();
    assert_eq!(
        bca,
        "UniqueIdentifier,Date,Bank,Type,Amount\nBCA-3,2025-03-07,BCA,DEBIT,-72500.25\n"
    );
    assert!(
        fs.paths()
            .iter()
            .all(|path| !path.to_string_lossy().contains("mandiri_"))
    );
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_full_run_on_disk(#[case] is_debug: bool) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    seed(&OsFileSystem, root);
    let config = config(root, is_debug);
    let db_path = config.db_path.clone();

    let store = StagingStore::open(&db_path).unwrap();
    let outcome = Reconciler::new(config, ParserRegistry::with_defaults(), OsFileSystem)
        .unwrap()
        .with_run_timestamp(TIMESTAMP)
        .run(store, &NoProgress, &CancellationToken::new())
        .unwrap();

    assert_eq!(outcome.summary.total_matched_trx, 3);
    let matched: &PathBuf = outcome.files.matched_system_trx.as_ref().unwrap();
    assert!(matched.is_file());

    let reopened = StagingStore::open(&db_path).unwrap();
    assert_eq!(reopened.is_prepared().unwrap(), is_debug);
}
