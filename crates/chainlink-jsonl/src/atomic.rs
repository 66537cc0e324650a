//! Atomic JSONL writes.
//!
//! Values are written to `<path>.tmp`, flushed, then renamed over `path`.
//! A rename within one filesystem is atomic, so readers see either the old
//! file or the new one. A failed write may leave the temporary file behind;
//! the next successful write replaces it.

use crate::Result;
use serde::Serialize;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Write `values` one per line, replacing `path` atomically.
///
/// # Errors
///
/// Returns an error if a value fails to serialize or any file operation
/// fails. The original file is left untouched in that case.
pub async fn write_jsonl_atomic<'a, T, I, P>(path: P, values: I) -> Result<()>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");
    let file = File::create(&temp_path).await?;
    let mut writer = BufWriter::new(file);

    let mut count = 0usize;
    for value in values {
        let json = serde_json::to_string(value)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        count += 1;
    }

    writer.flush().await?;
    tokio::fs::rename(&temp_path, path).await?;
    tracing::debug!(path = %path.display(), lines = count, "Wrote JSONL file");
    Ok(())
}
