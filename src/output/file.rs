//! Streaming payload writer
//!
//! Every transfer gets its own temp file in the destination directory. Bytes go
//! through a buffered writer, are flushed, the handle is closed, and only then is
//! the temp file persisted under the final name. The temp file is removed when
//! the transfer fails or its future is dropped, so an abandoned or failed
//! transfer never leaves a file under the final name.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::ffi::OsString;
use std::path::Path;
use tempfile::{Builder, TempPath};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use super::{OutputError, OutputResult};
use crate::fetcher::FetcherError;

const DEFAULT_BUFFER_SIZE: usize = 64 * 1024; // 64KB buffer

/// Write a payload stream to `dest`
///
/// An existing file at `dest` is replaced.
///
/// # Returns
/// Number of bytes written
pub async fn write_payload<S>(dest: &Path, stream: S) -> OutputResult<u64>
where
    S: Stream<Item = Result<Bytes, FetcherError>> + Unpin,
{
    let (file, temp_path) = create_temp(dest)?;

    // `temp_path` deletes the file if this returns early or is dropped
    let bytes_written = write_temp(File::from_std(file), stream).await?;

    temp_path.persist(dest).map_err(|e| {
        OutputError::IoError(format!("failed to move {} into place: {e}", dest.display()))
    })?;
    debug!(path = %dest.display(), bytes = bytes_written, "Payload written");
    Ok(bytes_written)
}

/// Temp file next to `dest`, named `.<name>.<random>.part`
fn create_temp(dest: &Path) -> OutputResult<(std::fs::File, TempPath)> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut prefix = OsString::from(".");
    if let Some(name) = dest.file_name() {
        prefix.push(name);
        prefix.push(".");
    }

    let temp = Builder::new()
        .prefix(&prefix)
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| {
            OutputError::IoError(format!("failed to create temp file for {}: {e}", dest.display()))
        })?;
    Ok(temp.into_parts())
}

async fn write_temp<S>(file: File, mut stream: S) -> OutputResult<u64>
where
    S: Stream<Item = Result<Bytes, FetcherError>> + Unpin,
{
    let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);
    let mut bytes_written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| OutputError::StreamError(e.to_string()))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| OutputError::IoError(format!("write failed: {e}")))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| OutputError::IoError(format!("flush failed: {e}")))?;
    // Closes the handle before the rename
    drop(writer);

    Ok(bytes_written)
}
