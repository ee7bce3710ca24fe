//! Utility functions for error handling
//!
//! Opening reference files goes through here so every failure carries the
//! offending path and what the file was needed for.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{IpsMapError, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(IpsMapError::io(
            path,
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found, needed for {purpose}"),
            ),
        ));
    }

    if !path.is_file() {
        return Err(IpsMapError::io(
            path,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path is not a file, expected a file for {purpose}"),
            ),
        ));
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => {
                "permission denied - check file permissions".to_string()
            }
            _ => format!("failed to open file for {purpose}: {e}"),
        };
        IpsMapError::io(path, io::Error::new(e.kind(), context))
    })
}

/// Read a whole file into memory, stripping a UTF-8 byte-order mark if present
pub fn read_without_bom(path: &Path, purpose: &str) -> Result<Vec<u8>> {
    let mut file = safe_open_file(path, purpose)?;
    let mut bytes = Vec::new();
    io::Read::read_to_end(&mut file, &mut bytes).map_err(|e| IpsMapError::io(path, e))?;

    const BOM: &[u8] = b"\xEF\xBB\xBF";
    if bytes.starts_with(BOM) {
        bytes.drain(..BOM.len());
    }
    Ok(bytes)
}
