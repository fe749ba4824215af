pub mod annotations;
pub mod matrix;
pub mod resolver;
pub mod sample;
pub mod scheduler;

use std::path::{Path, PathBuf};

use crate::compile::matrix::write_matrix;
use crate::compile::scheduler::{compile_all, discover_sample_files, CompilationResult, CompileConfig};
use crate::core::error::Result;
use crate::core::features::build_index;
use crate::core::sample_name::SampleNaming;

/// Where the per-sample annotation files come from
#[derive(Debug, Clone)]
pub enum SampleInput {
    Files(Vec<PathBuf>),
    Directory { dir: PathBuf, suffix: String },
}

impl SampleInput {
    fn resolve(self) -> Result<Vec<PathBuf>> {
        match self {
            SampleInput::Files(files) => Ok(files),
            SampleInput::Directory { dir, suffix } => discover_sample_files(dir, &suffix),
        }
    }
}

/// Build the gene index, compile every sample and write the matrix.
///
/// Nothing is written unless every sample compiled.
pub fn run_compile(
    feature_file: &Path,
    input: SampleInput,
    output_path: &Path,
    config: &CompileConfig,
    naming: &dyn SampleNaming,
) -> Result<CompilationResult> {
    let index = build_index(feature_file)?;
    let files = input.resolve()?;

    let result = compile_all(&files, &index, config, naming)?;
    write_matrix(&result, output_path)?;

    Ok(result)
}
