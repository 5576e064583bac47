//! Copying one segment's raw bytes to a file.

use crate::error::DumpError;
use crate::host::{MemoryReader, Messages, SaveDialog, SegmentDescriptor};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suggested file name when the segment has none.
const FALLBACK_FILE_NAME: &str = "segment";

/// Result of a completed dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub path: PathBuf,
    /// Bytes written.
    pub size: usize,
    /// Bytes the host had content for. The rest are placeholders.
    pub defined: usize,
}

/// File name suggested in the save dialog for a segment.
pub fn default_file_name(segment_name: &str) -> String {
    let name: String = segment_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    if name.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        name
    }
}

/// Ask for a destination and write the segment's bytes to it verbatim.
///
/// Each step gates the next one: a cancelled prompt, a failed allocation,
/// or a failed open or write stops the dump. The read itself never fails;
/// bytes the host has no content for are written as its placeholder.
pub fn dump_segment<R, D>(
    segment: &SegmentDescriptor,
    reader: &R,
    dialog: &mut D,
) -> Result<DumpReport, DumpError>
where
    R: MemoryReader + ?Sized,
    D: SaveDialog + ?Sized,
{
    let path = dialog
        .prompt_save_path(&default_file_name(segment.name()))
        .ok_or(DumpError::UserCancelled)?;

    let size = usize::try_from(segment.size())
        .map_err(|_| DumpError::AllocationFailure { requested: usize::MAX })?;
    let mut buffer = alloc_buffer(size)?;

    let defined = reader.read_bytes(segment.start(), &mut buffer);
    if defined < size {
        debug!(
            segment = segment.name(),
            size,
            defined,
            "Segment has bytes without content"
        );
    }

    write_file(&path, &buffer)?;
    Ok(DumpReport {
        path,
        size,
        defined,
    })
}

/// Run [`dump_segment`] and print the outcome to the message window.
/// Cancellation prints nothing.
pub fn report_dump<R, D, M>(
    segment: &SegmentDescriptor,
    reader: &R,
    dialog: &mut D,
    messages: &mut M,
) -> Result<DumpReport, DumpError>
where
    R: MemoryReader + ?Sized,
    D: SaveDialog + ?Sized,
    M: Messages + ?Sized,
{
    let result = dump_segment(segment, reader, dialog);
    match &result {
        Ok(report) => {
            info!(
                segment = segment.name(),
                path = %report.path.display(),
                size = report.size,
                "Segment dumped"
            );
            messages.msg(&format!("Dumping {} to disk... Done!\n", segment.name()));
        }
        Err(e) if e.is_cancelled() => {
            debug!(segment = segment.name(), "Dump cancelled");
        }
        Err(e) => {
            warn!(segment = segment.name(), error = %e, "Failed to dump segment");
            messages.msg(&format!("Dumping {} to disk... Failed!\n", segment.name()));
        }
    }
    result
}

fn alloc_buffer(size: usize) -> Result<Vec<u8>, DumpError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|_| DumpError::AllocationFailure { requested: size })?;
    buffer.resize(size, 0);
    Ok(buffer)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), DumpError> {
    let mut file = File::create(path).map_err(|source| DumpError::IoOpenFailure {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(bytes)
        .map_err(|source| DumpError::IoWriteFailure {
            path: path.to_path_buf(),
            source,
        })
}
