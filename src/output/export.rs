//! JSON export of page results

use crate::crawler::PageResult;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `pages` to `path` as a pretty-printed JSON array
///
/// Parent directories are created as needed. Output is UTF-8 with non-ASCII
/// characters written as-is.
pub fn write_results(path: &Path, pages: &[PageResult]) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, pages)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!("Wrote {} results to {}", pages.len(), path.display());
    Ok(())
}
