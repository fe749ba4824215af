use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = MutationError> = std::result::Result<T, E>;

/// Failure kinds raised while compiling gene mutations
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("Failed to access '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed feature file '{}': {reason}", path.display())]
    MalformedFeatureFile { path: PathBuf, reason: String },

    #[error(
        "Malformed annotation record in '{}' at line {line}: expected at least {expected} tab-separated fields, found {found}",
        path.display()
    )]
    MalformedAnnotationRecord {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid sample file name '{file_name}': {reason}")]
    InvalidSampleFileName { file_name: String, reason: String },

    #[error("Duplicate sample '{sample}' in compilation result")]
    DuplicateSample { sample: String },

    #[error("Sample '{sample}' has no call for gene '{gene}' present in other samples")]
    InconsistentGeneUniverse { sample: String, gene: String },

    #[error("Compilation failed for sample '{sample}' ({})", path.display())]
    WorkerFailure {
        sample: String,
        path: PathBuf,
        #[source]
        source: Box<MutationError>,
    },

    #[error("No files ending in '{suffix}' found in '{}'", dir.display())]
    NoSampleFiles { dir: PathBuf, suffix: String },

    #[error("Unknown mutation category '{value}' for gene '{gene}' at row {row}")]
    UnknownCategory {
        value: String,
        gene: String,
        row: usize,
    },

    #[error("Malformed matrix '{}' at row {row}: {reason}", path.display())]
    MalformedMatrix {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl MutationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
