use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::core::error::{MutationError, Result};

const CONSEQUENCE_COL: usize = 1;
const GENE_COL: usize = 2;
const MIN_ANNOTATION_FIELDS: usize = GENE_COL + 1;

/// One consequence label reported for one gene
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub gene_id: String,
    pub label: String,
}

/// Lazily parses an exonic variant annotation file.
///
/// Expected layout per line (tab-separated):
/// ```text
/// line1    nonsynonymous SNV    geneA:rna-1:exon1:c.A10G:p.K4E,    contig1    110    110    A    G
/// ```
/// Column 2 holds the consequence label, column 3 starts with `<gene_id>:`.
/// Lines starting with `#` and blank lines are skipped.
pub struct AnnotationReader<R> {
    lines: Lines<R>,
    path: PathBuf,
    line_num: usize,
}

impl AnnotationReader<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MutationError::io(path, e))?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> AnnotationReader<R> {
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            lines: reader.lines(),
            path: path.into(),
            line_num: 0,
        }
    }

    fn parse_line(&self, line: &str) -> Result<Observation> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_ANNOTATION_FIELDS {
            return Err(MutationError::MalformedAnnotationRecord {
                path: self.path.clone(),
                line: self.line_num,
                expected: MIN_ANNOTATION_FIELDS,
                found: fields.len(),
            });
        }

        let gene_id = fields[GENE_COL]
            .split(':')
            .next()
            .unwrap_or_default()
            .trim();

        Ok(Observation {
            gene_id: gene_id.to_string(),
            label: fields[CONSEQUENCE_COL].trim().to_string(),
        })
    }
}

impl<R: BufRead> Iterator for AnnotationReader<R> {
    type Item = Result<Observation>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(MutationError::io(&self.path, e))),
            };
            self.line_num += 1;

            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            return Some(self.parse_line(&line));
        }
    }
}

pub fn read_annotations(path: impl AsRef<Path>) -> Result<AnnotationReader<BufReader<File>>> {
    AnnotationReader::from_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn observations(content: &str) -> Result<Vec<Observation>> {
        AnnotationReader::new(Cursor::new(content), "sample.exonic_variant_function").collect()
    }

    fn obs(gene_id: &str, label: &str) -> Observation {
        Observation {
            gene_id: gene_id.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_parse_records() {
        let content = "# header\n\
            line1\tnonsynonymous SNV\tgeneA:rna-1:exon1:c.A10G:p.K4E,\tcontig1\t110\t110\tA\tG\n\
            \n\
            line2\tstopgain\tgeneB:rna-2:exon1:c.C7T:p.Q3X,geneB:rna-3:exon2:c.C7T:p.Q3X,\tcontig1\t307\t307\tC\tT\n\
            line3\tunknown\tUNKNOWN\tcontig2\t20\t20\tG\tA\n";

        assert_eq!(
            observations(content).unwrap(),
            vec![
                obs("geneA", "nonsynonymous SNV"),
                obs("geneB", "stopgain"),
                obs("UNKNOWN", "unknown"),
            ]
        );
    }

    #[test]
    fn test_too_few_fields() {
        let content = "line1\tstopgain\tgeneA:x\n\
            # comment\n\
            line2\tstopgain\n";
        let err = observations(content).unwrap_err();
        match err {
            MutationError::MalformedAnnotationRecord {
                line,
                expected,
                found,
                ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_reader_is_lazy() {
        // The malformed line is never reached when only the first record is taken
        let content = "line1\tstoploss\tgeneC:x\nbroken\n";
        let mut reader = AnnotationReader::new(Cursor::new(content), "lazy.txt");
        assert_eq!(reader.next().unwrap().unwrap(), obs("geneC", "stoploss"));
        assert!(reader.next().unwrap().is_err());
    }

    #[test]
    fn test_read_annotations_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "line1\tsynonymous SNV\tgeneA:rna-1:exon1:c.A3G:p.K1K,\tc1\t3\t3\tA\tG").unwrap();

        let records: Vec<_> = read_annotations(file.path())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records, vec![obs("geneA", "synonymous SNV")]);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_annotations("missing.exonic_variant_function"),
            Err(MutationError::Io { .. })
        ));
    }
}
