//! Report output.
//!
//! Files are written through a temporary file in the destination directory
//! and renamed into place, so a failed run never leaves a half-written
//! report behind.

use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use crate::config::OutputTarget;
use crate::error::ReportResult;

/// Write `document` (plus a final newline) to `target`.
pub fn write_report(document: &str, target: &OutputTarget) -> ReportResult<()> {
    match target {
        OutputTarget::Stdout => {
            let mut out = io::stdout().lock();
            out.write_all(document.as_bytes())?;
            out.write_all(b"\n")?;
            out.flush()?;
        }
        OutputTarget::File(path) => {
            write_atomic(path, document)?;
            info!(path = %path.display(), bytes = document.len() + 1, "report written");
        }
    }
    Ok(())
}

fn write_atomic(path: &Path, document: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(document.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
