use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use noodles_bgzf as bgzf;

use crate::core::error::{MutationError, Result};
use crate::core::output::temp_sibling;

const CONTIG_HEADER_PREFIX: &str = "##contig=<ID=";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameSummary {
    pub header_lines: usize,
    pub records: usize,
}

fn is_bgzf(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "gz" || e == "bgz")
        .unwrap_or(false)
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| MutationError::io(path, e))?;
    if is_bgzf(path) {
        Ok(Box::new(BufReader::new(bgzf::Reader::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Rewrite every contig name in a VCF to `new_name`.
///
/// Both `##contig` header IDs and the CHROM column of each record are
/// replaced. `.gz`/`.bgz` paths are read and written as BGZF.
pub fn rename_contigs(input: &Path, output: &Path, new_name: &str) -> Result<RenameSummary> {
    let reader = open_input(input)?;
    let io_err = |e| MutationError::io(output, e);

    let mut tmp = temp_sibling(output)?;

    let summary = if is_bgzf(output) {
        let mut writer = bgzf::Writer::new(tmp.as_file_mut());
        let summary = rewrite(reader, &mut writer, new_name, input, output)?;
        writer.finish().map_err(io_err)?;
        summary
    } else {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let summary = rewrite(reader, &mut writer, new_name, input, output)?;
        writer.flush().map_err(io_err)?;
        summary
    };

    tmp.persist(output).map_err(|e| io_err(e.error))?;

    info!(
        "Renamed contigs to '{}' in {} header lines and {} records; written to {}",
        new_name,
        summary.header_lines,
        summary.records,
        output.display()
    );
    Ok(summary)
}

fn rewrite<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    new_name: &str,
    input: &Path,
    output: &Path,
) -> Result<RenameSummary> {
    let mut summary = RenameSummary::default();
    let write_err = |e| MutationError::io(output, e);

    for line in reader.lines() {
        let line = line.map_err(|e| MutationError::io(input, e))?;

        if let Some(rest) = line.strip_prefix(CONTIG_HEADER_PREFIX) {
            let id_end = rest.find([',', '>']).unwrap_or(rest.len());
            writeln!(writer, "{}{}{}", CONTIG_HEADER_PREFIX, new_name, &rest[id_end..])
                .map_err(write_err)?;
            summary.header_lines += 1;
        } else if line.starts_with('#') || line.is_empty() {
            writeln!(writer, "{}", line).map_err(write_err)?;
        } else {
            match line.split_once('\t') {
                Some((_, rest)) => writeln!(writer, "{}\t{}", new_name, rest),
                None => writeln!(writer, "{}", new_name),
            }
            .map_err(write_err)?;
            summary.records += 1;
        }
    }

    Ok(summary)
}
