use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::compile::matrix::GENE_HEADER;
use crate::compile::resolver::{Category, Mode};
use crate::core::error::{MutationError, Result};
use crate::core::output::write_tsv_atomically;

const PRESENCE_SUFFIX: &str = "_filtered_numeric.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceSummary {
    /// Genes mutated in at least one sample
    pub retained: usize,
    /// Genes wildtype in every sample
    pub skipped: usize,
    pub samples: usize,
}

/// `<dir>/<stem>_filtered_numeric.txt` next to the input matrix
pub fn default_output_path(matrix_path: &Path) -> PathBuf {
    let stem = matrix_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    matrix_path.with_file_name(format!("{}{}", stem, PRESENCE_SUFFIX))
}

/// 0 for wildtype, 1 for any other category of either vocabulary
fn presence_value(cell: &str) -> Option<u8> {
    Category::parse(cell, Mode::Multiple)
        .or_else(|| Category::parse(cell, Mode::Binary))
        .map(|category| u8::from(!category.is_wildtype()))
}

/// Convert a gene mutation matrix into the 0/1 presence table read by the
/// association test, dropping genes that are wildtype in every sample.
pub fn to_presence(matrix_path: &Path, output_path: &Path) -> Result<PresenceSummary> {
    let file = File::open(matrix_path).map_err(|e| MutationError::io(matrix_path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let malformed = |row: usize, reason: String| MutationError::MalformedMatrix {
        path: matrix_path.to_path_buf(),
        row,
        reason,
    };

    let header = reader.headers()?.clone();
    if header.get(0) != Some(GENE_HEADER) {
        return Err(malformed(
            1,
            format!("expected first column '{}'", GENE_HEADER),
        ));
    }
    let num_samples = header.len() - 1;

    let mut rows: Vec<(String, Vec<u8>)> = Vec::new();
    let mut skipped = 0usize;

    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 2;
        if record.len() != header.len() {
            return Err(malformed(
                row,
                format!("expected {} columns, found {}", header.len(), record.len()),
            ));
        }

        let gene = record.get(0).unwrap_or_default().to_string();
        let values = record
            .iter()
            .skip(1)
            .map(|cell| {
                presence_value(cell).ok_or_else(|| MutationError::UnknownCategory {
                    value: cell.to_string(),
                    gene: gene.clone(),
                    row,
                })
            })
            .collect::<Result<Vec<u8>>>()?;

        let mutated = values.iter().filter(|&&v| v == 1).count();
        if mutated == 0 {
            debug!("Gene {} has no mutations in the population. Skipping.", gene);
            skipped += 1;
            continue;
        }
        debug!(
            "Gene {} has a mutation rate of {:.4}",
            gene,
            mutated as f64 / num_samples as f64
        );
        rows.push((gene, values));
    }

    write_tsv_atomically(output_path, |writer| {
        writer.write_record(&header)?;
        for (gene, values) in &rows {
            writer.write_record(
                std::iter::once(gene.clone()).chain(values.iter().map(|v| v.to_string())),
            )?;
        }
        Ok(())
    })?;

    let summary = PresenceSummary {
        retained: rows.len(),
        skipped,
        samples: num_samples,
    };
    info!(
        "Kept {} genes across {} samples, skipped {} genes with no mutations. Presence table written to {}",
        summary.retained,
        summary.samples,
        summary.skipped,
        output_path.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn write_matrix(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("gene_mutations.tsv");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_multiple_mode_matrix() {
        let dir = TempDir::new().unwrap();
        let matrix = write_matrix(
            &dir,
            "Gene\tS1\tS2\tS3\n\
             geneA\tmissense\twildtype\tnonsense\n\
             geneB\twildtype\twildtype\twildtype\n\
             geneC\tsilent\tnonstop\twildtype\n",
        );
        let output = default_output_path(&matrix);

        let summary = to_presence(&matrix, &output).unwrap();

        assert_eq!(
            summary,
            PresenceSummary {
                retained: 2,
                skipped: 1,
                samples: 3
            }
        );
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "Gene\tS1\tS2\tS3\ngeneA\t1\t0\t1\ngeneC\t1\t1\t0\n"
        );
    }

    #[test]
    fn test_binary_mode_matrix() {
        let dir = TempDir::new().unwrap();
        let matrix = write_matrix(&dir, "Gene\tS1\tS2\ngeneA\tmutated\twildtype\n");
        let output = dir.path().join("presence.tsv");

        let summary = to_presence(&matrix, &output).unwrap();
        assert_eq!(summary.retained, 1);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "Gene\tS1\tS2\ngeneA\t1\t0\n"
        );
    }

    #[test]
    fn test_unknown_category() {
        let dir = TempDir::new().unwrap();
        let matrix = write_matrix(&dir, "Gene\tS1\ngeneA\tmissense\ngeneB\tframeshift\n");
        let output = dir.path().join("presence.tsv");

        let err = to_presence(&matrix, &output).unwrap_err();
        match err {
            MutationError::UnknownCategory { value, gene, row } => {
                assert_eq!(value, "frameshift");
                assert_eq!(gene, "geneB");
                assert_eq!(row, 3);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!output.exists());
    }

    #[rstest]
    #[case("Sample\tS1\ngeneA\tmissense\n", "expected first column")]
    #[case("Gene\tS1\tS2\ngeneA\tmissense\n", "expected 3 columns, found 2")]
    fn test_malformed_matrix(#[case] content: &str, #[case] expected: &str) {
        let dir = TempDir::new().unwrap();
        let matrix = write_matrix(&dir, content);

        let err = to_presence(&matrix, &dir.path().join("out.tsv")).unwrap_err();
        assert!(matches!(err, MutationError::MalformedMatrix { .. }));
        assert!(err.to_string().contains(expected), "{}", err);
    }

    #[rstest]
    #[case("wildtype", Some(0))]
    #[case("mutated", Some(1))]
    #[case("silent", Some(1))]
    #[case("nonsense", Some(1))]
    #[case("", None)]
    fn test_presence_value(#[case] cell: &str, #[case] expected: Option<u8>) {
        assert_eq!(presence_value(cell), expected);
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/out/gene_mutation_summary.txt")),
            PathBuf::from("/out/gene_mutation_summary_filtered_numeric.txt")
        );
    }
}
