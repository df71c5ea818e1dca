//! The reconciliation pipeline: discovery, ingestion, staging, matching and
//! report export, driven stage by stage by [`Reconciler`].

pub mod discovery;
pub mod ingest;
pub mod orchestrator;
pub mod progress;
pub mod report;

pub use discovery::{BankFile, BankFileMatcher};
pub use ingest::{Ingestor, build_worker_pool};
pub use orchestrator::{ReconciliationOutcome, Reconciler};
pub use progress::{NoProgress, Progress, TracingProgress};
pub use report::{ReportFiles, ReportWriter};
