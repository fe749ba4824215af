use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bio::io::gff;
use indexmap::IndexMap;
use log::{debug, info, warn};
use percent_encoding::percent_decode_str;

use crate::core::error::{MutationError, Result};

/// Feature types that define a gene in the feature file
pub const GENE_FEATURE_TYPES: [&str; 2] = ["gene", "CDS"];

const TYPE_COL: usize = 2;
const GFF_COLUMNS: usize = 9;

/// 1-based, inclusive coordinates of one gene segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

/// A gene and every coordinate segment declared for it, grouped by contig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRecord {
    pub id: String,
    pub name: Option<String>,
    segments: IndexMap<String, Vec<Interval>>, // contig -> segments, declaration order
}

impl GeneRecord {
    fn new(id: String) -> Self {
        Self {
            id,
            name: None,
            segments: IndexMap::new(),
        }
    }

    fn add_segment(&mut self, contig: &str, interval: Interval) {
        self.segments
            .entry(contig.to_string())
            .or_default()
            .push(interval);
    }

    pub fn num_segments(&self) -> usize {
        self.segments.values().map(Vec::len).sum()
    }
}

/// Genes parsed from a GFF3 feature file, keyed by identifier in declaration order.
///
/// Read-only once built. Repeated identifiers accumulate segments instead of
/// replacing earlier ones.
#[derive(Debug, Clone, Default)]
pub struct GeneIndex {
    genes: IndexMap<String, GeneRecord>,
}

impl GeneIndex {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MutationError::io(path, e))?;
        let index = Self::from_reader(BufReader::new(file), path)?;

        let segments: usize = index.genes.values().map(GeneRecord::num_segments).sum();
        info!(
            "Loaded {} genes ({} segments) from {}",
            index.len(),
            segments,
            path.display()
        );
        Ok(index)
    }

    /// Parse features from any buffered reader. `source` is only used in error messages.
    ///
    /// Lines after a `##FASTA` directive are ignored, as are lines whose type
    /// column is not one of [`GENE_FEATURE_TYPES`]. Recognised lines are parsed
    /// as GFF3 records, with percent-encoded `ID` and `Name` values decoded.
    pub fn from_reader<R: BufRead>(reader: R, source: &Path) -> Result<Self> {
        let malformed = |reason: String| MutationError::MalformedFeatureFile {
            path: source.to_path_buf(),
            reason,
        };

        let (features, line_nums) = gene_feature_lines(reader, source)?;
        let mut gff_reader = gff::Reader::new(features.as_bytes(), gff::GffType::GFF3);
        let mut genes: IndexMap<String, GeneRecord> = IndexMap::new();

        for (record, &line_num) in gff_reader.records().zip(&line_nums) {
            let record = record.map_err(|e| malformed(format!("line {}: {}", line_num, e)))?;

            let (start, end) = (*record.start(), *record.end());
            if start == 0 || end == 0 {
                return Err(malformed(format!(
                    "line {}: coordinates are 1-based, found {}..{}",
                    line_num, start, end
                )));
            }
            if start > end {
                return Err(malformed(format!(
                    "line {}: start {} is greater than end {}",
                    line_num, start, end
                )));
            }

            let attributes = record.attributes();
            let id = decoded_attribute(attributes.get("ID"))
                .ok_or_else(|| malformed(format!("line {}: missing ID attribute", line_num)))?;
            let name = decoded_attribute(attributes.get("Name"));

            let gene = genes
                .entry(id.clone())
                .or_insert_with(|| GeneRecord::new(id.clone()));

            match gene.name.as_deref() {
                None => gene.name = name,
                Some(existing) => {
                    if let Some(name) = name.filter(|n| n != existing) {
                        warn!(
                            "Gene ID {} has multiple names ('{}', '{}'). Keeping the first one.",
                            id, existing, name
                        );
                    }
                }
            }

            gene.add_segment(record.seqname(), Interval::new(start, end));
        }

        if genes.is_empty() {
            return Err(malformed(format!(
                "no {} features found",
                GENE_FEATURE_TYPES.join(" or ")
            )));
        }

        Ok(Self { genes })
    }

    /// Position of a gene in declaration order
    pub fn index_of(&self, gene_id: &str) -> Option<usize> {
        self.genes.get_index_of(gene_id)
    }

    /// Gene identifiers in declaration order
    pub fn gene_ids(&self) -> impl Iterator<Item = &str> {
        self.genes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

pub fn build_index(feature_file: impl AsRef<Path>) -> Result<GeneIndex> {
    GeneIndex::from_file(feature_file)
}

/// Collect the gene and CDS lines of the feature section, with their line numbers.
///
/// Everything else is skipped before the GFF reader sees it, since it
/// requires every record to carry the same number of columns.
fn gene_feature_lines<R: BufRead>(reader: R, source: &Path) -> Result<(String, Vec<usize>)> {
    let mut features = String::new();
    let mut line_nums = Vec::new();
    let mut skipped = 0usize;

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MutationError::io(source, e))?;
        let line_num = line_idx + 1;

        if line.starts_with("##FASTA") {
            break;
        }
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let is_gene = line
            .split('\t')
            .nth(TYPE_COL)
            .is_some_and(|ty| GENE_FEATURE_TYPES.contains(&ty));
        if !is_gene {
            skipped += 1;
            continue;
        }

        let columns = line.split('\t').count();
        if columns != GFF_COLUMNS {
            return Err(MutationError::MalformedFeatureFile {
                path: source.to_path_buf(),
                reason: format!(
                    "line {}: expected {} tab-separated columns, found {}",
                    line_num, GFF_COLUMNS, columns
                ),
            });
        }

        features.push_str(&line);
        features.push('\n');
        line_nums.push(line_num);
    }

    debug!(
        "Skipped {} feature lines that are not {}",
        skipped,
        GENE_FEATURE_TYPES.join(" or ")
    );
    Ok((features, line_nums))
}

/// Trimmed, percent-decoded attribute value; empty values count as absent
fn decoded_attribute(value: Option<&String>) -> Option<String> {
    let value = value?.trim();
    let decoded = percent_decode_str(value).decode_utf8_lossy().into_owned();
    Some(decoded).filter(|v| !v.is_empty())
}
