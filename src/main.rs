//! Reconciliation job entry point.

use anyhow::Context;
use bank_reconcile::{
    CancellationToken, OsFileSystem, ParserRegistry, ReconcileConfig, Reconciler, StagingStore,
    TracingProgress,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let config = ReconcileConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        system_trx_path = %config.system_trx_path.display(),
        bank_trx_path = %config.bank_trx_path.display(),
        report_trx_path = %config.report_trx_path.display(),
        db_path = %config.db_path.display(),
        is_debug = config.is_debug,
        "Configuration loaded"
    );

    let store = StagingStore::open(&config.db_path)
        .with_context(|| format!("failed to open staging store {}", config.db_path.display()))?;
    let reconciler = Reconciler::new(config, ParserRegistry::with_defaults(), OsFileSystem)
        .context("failed to build reconciler")?;

    let outcome = reconciler
        .run(store, &TracingProgress, &CancellationToken::new())
        .context("reconciliation failed")?;

    let summary = &outcome.summary;
    tracing::info!(
        total_system_trx = summary.total_system_trx,
        total_matched_trx = summary.total_matched_trx,
        total_not_matched_trx = summary.total_not_matched_trx,
        sum_system_trx = %summary.sum_system_trx,
        sum_matched_trx = %summary.sum_matched_trx,
        sum_discrepancies_trx = %summary.sum_discrepancies_trx,
        total_bank_trx = summary.total_bank_trx,
        total_not_matched_bank_trx = summary.total_not_matched_bank_trx,
        "Reconciliation summary"
    );

    if let Some(path) = &outcome.files.matched_system_trx {
        tracing::info!(file = %path.display(), "Matched system transactions");
    }
    if let Some(path) = &outcome.files.not_matched_system_trx {
        tracing::info!(file = %path.display(), "Not matched system transactions");
    }
    for (bank, path) in &outcome.files.not_matched_bank_trx {
        tracing::info!(bank = %bank, file = %path.display(), "Not matched bank transactions");
    }

    Ok(())
}
