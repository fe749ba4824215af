use std::path::Path;

use indexmap::IndexMap;
use log::debug;

use crate::compile::annotations::{read_annotations, Observation};
use crate::compile::resolver::{Category, Mode, ObservedConsequences};
use crate::core::error::Result;
use crate::core::features::GeneIndex;
use crate::core::sample_name::SampleNaming;

/// Resolved category for every indexed gene in one sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleMutations {
    pub sample_id: String,
    calls: IndexMap<String, Category>, // gene_id -> category, gene index order
}

impl SampleMutations {
    pub fn new(sample_id: impl Into<String>, calls: IndexMap<String, Category>) -> Self {
        Self {
            sample_id: sample_id.into(),
            calls,
        }
    }

    pub fn get(&self, gene_id: &str) -> Option<Category> {
        self.calls.get(gene_id).copied()
    }

    pub fn genes(&self) -> impl Iterator<Item = &str> {
        self.calls.keys().map(String::as_str)
    }

    /// Number of genes not resolved to wildtype
    pub fn num_mutated(&self) -> usize {
        self.calls.values().filter(|c| !c.is_wildtype()).count()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Compile one annotation file into per-gene categories.
///
/// The returned map covers every gene in `index` exactly once; genes without
/// observations resolve to wildtype and unindexed genes are dropped.
pub fn compile_sample(
    path: &Path,
    index: &GeneIndex,
    mode: Mode,
    naming: &dyn SampleNaming,
) -> Result<SampleMutations> {
    let sample_id = naming.sample_id(path)?;
    let calls = resolve_calls(read_annotations(path)?, index, mode)?;

    let sample = SampleMutations::new(sample_id, calls);
    debug!(
        "Sample {}: {} of {} genes mutated",
        sample.sample_id,
        sample.num_mutated(),
        sample.len()
    );
    Ok(sample)
}

/// Group observations by indexed gene and resolve each group
pub fn resolve_calls<I>(observations: I, index: &GeneIndex, mode: Mode) -> Result<IndexMap<String, Category>>
where
    I: IntoIterator<Item = Result<Observation>>,
{
    let mut observed = vec![ObservedConsequences::new(); index.len()];
    let mut skipped = 0usize;

    for observation in observations {
        let observation = observation?;
        match index.index_of(&observation.gene_id) {
            Some(gene_idx) => observed[gene_idx].observe(&observation.label),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("Skipped {} records for genes not in the feature index", skipped);
    }

    Ok(index
        .gene_ids()
        .zip(observed)
        .map(|(gene_id, consequences)| (gene_id.to_string(), consequences.resolve(mode)))
        .collect())
}
