use crate::errors::{ReconcileError, ReconcileResult};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use std::any::Any;
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, warn};

/// Shared decode loop for every CSV layout.
///
/// Reads the header (or falls back to `canonical_header` for headerless
/// files), deserializes each row into `Raw` and hands it to `convert`.
/// Rows that fail to deserialize or convert are logged and skipped. Only a
/// file whose header cannot be read, an I/O failure mid-file, or a panic
/// inside the decoder fails the whole file.
pub fn decode_rows<Raw, T, F>(
    reader: Box<dyn Read + Send>,
    has_header: bool,
    canonical_header: &[&str],
    source_file: &Path,
    convert: F,
) -> ReconcileResult<Vec<T>>
where
    Raw: DeserializeOwned,
    F: FnMut(Raw) -> Result<T, String>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        decode_inner(reader, has_header, canonical_header, source_file, convert)
    }));

    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let message = format!("recovered from panic: {}", panic_message(payload.as_ref()));
            warn!(file = %source_file.display(), error = %message, "decoder panicked");
            Err(ReconcileError::ParseFailed(message))
        }
    }
}

fn decode_inner<Raw, T, F>(
    reader: Box<dyn Read + Send>,
    has_header: bool,
    canonical_header: &[&str],
    source_file: &Path,
    mut convert: F,
) -> ReconcileResult<Vec<T>>
where
    Raw: DeserializeOwned,
    F: FnMut(Raw) -> Result<T, String>,
{
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(has_header)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = if has_header {
        csv_reader.headers().cloned().map_err(|e| {
            ReconcileError::ParseFailed(format!(
                "cannot read header of '{}': {}",
                source_file.display(),
                e
            ))
        })?
    } else {
        StringRecord::from(canonical_header.to_vec())
    };

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (index, result) in csv_reader.records().enumerate() {
        let line = index + if has_header { 2 } else { 1 };

        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                skipped += 1;
                warn!(file = %source_file.display(), line, error = %e, "skipping unreadable row");
                continue;
            }
        };

        let decoded = record
            .deserialize::<Raw>(Some(&headers))
            .map_err(|e| e.to_string())
            .and_then(&mut convert);

        match decoded {
            Ok(value) => records.push(value),
            Err(e) => {
                skipped += 1;
                warn!(file = %source_file.display(), line, error = %e, "skipping undecodable row");
            }
        }
    }

    debug!(
        file = %source_file.display(),
        decoded = records.len(),
        skipped,
        "decoded csv file"
    );

    Ok(records)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
