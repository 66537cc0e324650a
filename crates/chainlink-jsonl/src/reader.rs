//! Resilient JSONL reading.

use crate::{Result, Warning};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A parsed value and the 1-based line it came from
pub type Line<T> = (usize, T);

/// Parse every non-blank line of `path` as `T`.
///
/// Lines that fail to parse become [`Warning::MalformedJson`] and are
/// skipped. A missing file reads as empty.
///
/// # Errors
///
/// Returns an error only for I/O failures.
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<Line<T>>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut values = Vec::new();
    let mut warnings = Vec::new();

    if !tokio::fs::try_exists(path).await? {
        tracing::debug!(path = %path.display(), "JSONL file missing; reading as empty");
        return Ok((values, warnings));
    }

    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(value) => values.push((line_number, value)),
            Err(e) => warnings.push(Warning::MalformedJson {
                line_number,
                error: e.to_string(),
            }),
        }
    }

    Ok((values, warnings))
}
