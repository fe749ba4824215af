use std::fs::File;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::core::error::{MutationError, Result};

/// Temporary file in the same directory as `output_path`, so that
/// persisting it is a rename on one filesystem.
pub fn temp_sibling(output_path: &Path) -> Result<NamedTempFile> {
    let dir = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    NamedTempFile::new_in(dir).map_err(|e| MutationError::io(dir, e))
}

/// Write a tab-separated file through a temporary sibling that is renamed
/// over `output_path` only after `write_rows` succeeds.
pub fn write_tsv_atomically<F>(output_path: &Path, write_rows: F) -> Result<()>
where
    F: FnOnce(&mut csv::Writer<&mut File>) -> Result<()>,
{
    let mut tmp = temp_sibling(output_path)?;

    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(tmp.as_file_mut());
        write_rows(&mut writer)?;
        writer
            .flush()
            .map_err(|e| MutationError::io(output_path, e))?;
    }
    tmp.as_file_mut()
        .flush()
        .map_err(|e| MutationError::io(output_path, e))?;

    tmp.persist(output_path)
        .map_err(|e| MutationError::io(output_path, e.error))?;
    Ok(())
}
