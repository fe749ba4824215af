use std::path::Path;

use indexmap::IndexSet;
use log::info;

use crate::compile::resolver::Category;
use crate::compile::scheduler::CompilationResult;
use crate::core::error::{MutationError, Result};
use crate::core::output::write_tsv_atomically;
use crate::core::utils::create_spinner;

pub const GENE_HEADER: &str = "Gene";

/// Gene-by-sample layout of a compilation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneMatrix {
    pub samples: Vec<String>,
    pub rows: Vec<(String, Vec<Category>)>,
}

impl GeneMatrix {
    pub fn num_genes(&self) -> usize {
        self.rows.len()
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }
}

/// Transpose per-sample calls into per-gene rows.
///
/// Genes appear in first-seen order across samples and columns follow sample
/// order. Fails on a sample missing a gene that another sample has.
pub fn build_matrix(result: &CompilationResult) -> Result<GeneMatrix> {
    let universe: IndexSet<&str> = result
        .samples()
        .flat_map(|sample| sample.genes())
        .collect();

    let mut rows: Vec<(String, Vec<Category>)> = universe
        .iter()
        .map(|gene| (gene.to_string(), Vec::with_capacity(result.len())))
        .collect();

    for sample in result.samples() {
        for (gene, row) in universe.iter().zip(rows.iter_mut()) {
            let category = sample
                .get(gene)
                .ok_or_else(|| MutationError::InconsistentGeneUniverse {
                    sample: sample.sample_id.clone(),
                    gene: gene.to_string(),
                })?;
            row.1.push(category);
        }
    }

    Ok(GeneMatrix {
        samples: result.sample_ids().map(str::to_string).collect(),
        rows,
    })
}

/// Write the tab-separated gene-by-sample matrix.
///
/// All validation happens before anything touches `output_path`, and the file
/// is written to a temporary sibling and renamed into place, so a failed call
/// leaves no partial matrix behind.
pub fn write_matrix(result: &CompilationResult, output_path: impl AsRef<Path>) -> Result<()> {
    let output_path = output_path.as_ref();
    let matrix = build_matrix(result)?;

    let spinner = create_spinner("Writing gene mutation matrix...");
    write_tsv_atomically(output_path, |writer| {
        writer.write_record(
            std::iter::once(GENE_HEADER).chain(matrix.samples.iter().map(String::as_str)),
        )?;
        for (gene, categories) in &matrix.rows {
            writer.write_record(
                std::iter::once(gene.as_str()).chain(categories.iter().map(|c| c.as_str())),
            )?;
        }
        Ok(())
    })?;

    spinner.finish_and_clear();
    info!(
        "Gene mutation matrix ({} genes x {} samples) written to {}",
        matrix.num_genes(),
        matrix.num_samples(),
        output_path.display()
    );
    Ok(())
}
