//! Locating input files below the configured roots.

use crate::errors::{ReconcileError, ReconcileResult};
use crate::fs::FileSystem;
use crate::types::ReconciliationWindow;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `<bankRoot>/.../<bankCode>/<file>.csv`; capture 1 is the bank code.
/// The extension is matched case-insensitively, as for system files.
const BANK_FILE_PATTERN: &str = r"(?i).*[\\/]+([^\\/]+)[\\/][^\\/]+\.csv$";

/// A statement file and the bank code taken from its parent directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankFile {
    pub bank: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct BankFileMatcher {
    pattern: Regex,
}

impl BankFileMatcher {
    pub fn new() -> ReconcileResult<Self> {
        let pattern = Regex::new(BANK_FILE_PATTERN)
            .map_err(|e| ReconcileError::Config(format!("bank file pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Bank code of `path`, if it looks like a statement file.
    pub fn bank_code(&self, path: &Path) -> Option<String> {
        let path = path.to_str()?;
        self.pattern
            .captures(path)
            .and_then(|captures| captures.get(1))
            .map(|code| code.as_str().to_string())
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Every `.csv` file below `root`.
pub fn discover_system_files(fs: &dyn FileSystem, root: &Path) -> ReconcileResult<Vec<PathBuf>> {
    let files: Vec<PathBuf> = fs.walk(root)?.into_iter().filter(|p| is_csv(p)).collect();
    debug!(root = %root.display(), files = files.len(), "system files discovered");
    Ok(files)
}

/// Statement files below `root` whose bank directory is accepted by `window`.
pub fn discover_bank_files(
    fs: &dyn FileSystem,
    root: &Path,
    window: &ReconciliationWindow,
) -> ReconcileResult<Vec<BankFile>> {
    let matcher = BankFileMatcher::new()?;
    let mut files = Vec::new();

    for path in fs.walk(root)? {
        let Some(bank) = matcher.bank_code(&path) else {
            continue;
        };

        if !window.accepts_bank(&bank) {
            debug!(path = %path.display(), bank = %bank, "bank not in scope, skipped");
            continue;
        }

        files.push(BankFile {
            bank: bank.to_ascii_uppercase(),
            path,
        });
    }

    debug!(root = %root.display(), files = files.len(), "bank files discovered");
    Ok(files)
}
