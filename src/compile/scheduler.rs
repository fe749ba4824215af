use std::error::Error as _;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use indexmap::map::Entry;
use indexmap::IndexMap;
use log::{error, info};
use rayon::prelude::*;

use crate::compile::resolver::Mode;
use crate::compile::sample::{compile_sample, SampleMutations};
use crate::core::error::{MutationError, Result};
use crate::core::features::GeneIndex;
use crate::core::sample_name::SampleNaming;
use crate::core::utils::{create_progress_bar, format_elapsed};

/// Settings for one compilation run
#[derive(Debug, Clone)]
pub struct CompileConfig {
    pub mode: Mode,
    /// Worker threads; `None` uses every available processing unit
    pub workers: Option<usize>,
    /// Stop at the first failed sample instead of attempting all of them
    pub fail_fast: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            workers: None,
            fail_fast: true,
        }
    }
}

impl CompileConfig {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.filter(|&n| n > 0).unwrap_or_else(|| {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }
}

/// Per-sample results in submission order, unique by sample identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationResult {
    samples: IndexMap<String, SampleMutations>,
}

impl CompilationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample, refusing a second entry under an existing identifier
    pub fn insert(&mut self, sample: SampleMutations) -> Result<()> {
        match self.samples.entry(sample.sample_id.clone()) {
            Entry::Occupied(entry) => Err(MutationError::DuplicateSample {
                sample: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(sample);
                Ok(())
            }
        }
    }

    pub fn get(&self, sample_id: &str) -> Option<&SampleMutations> {
        self.samples.get(sample_id)
    }

    pub fn samples(&self) -> impl Iterator<Item = &SampleMutations> {
        self.samples.values()
    }

    pub fn sample_ids(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Collect samples in order, failing on the first repeated identifier
impl TryFrom<Vec<SampleMutations>> for CompilationResult {
    type Error = MutationError;

    fn try_from(samples: Vec<SampleMutations>) -> Result<Self> {
        let mut result = Self::new();
        for sample in samples {
            result.insert(sample)?;
        }
        Ok(result)
    }
}

/// Compile every sample file in parallel against a shared, read-only gene index.
///
/// Results keep the order of `sample_files`. Any failed sample aborts the run
/// with [`MutationError::WorkerFailure`]; no partial result is returned.
pub fn compile_all(
    sample_files: &[PathBuf],
    index: &GeneIndex,
    config: &CompileConfig,
    naming: &dyn SampleNaming,
) -> Result<CompilationResult> {
    let start = Instant::now();
    let workers = config.worker_count();
    info!(
        "Compiling {} samples against {} genes with {} workers ({} mode)",
        sample_files.len(),
        index.len(),
        workers,
        config.mode
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()?;
    let pb = create_progress_bar(sample_files.len());

    let compile_one = |path: &PathBuf| -> Result<SampleMutations> {
        let result = compile_sample(path, index, config.mode, naming)
            .map_err(|e| worker_failure(path, naming, e));
        pb.inc(1);
        result
    };

    let outcome = pool.install(|| {
        if config.fail_fast {
            sample_files
                .par_iter()
                .map(&compile_one)
                .collect::<Result<Vec<_>>>()
        } else {
            let outcomes: Vec<Result<SampleMutations>> =
                sample_files.par_iter().map(&compile_one).collect();
            first_failure(outcomes)
        }
    });

    let samples = match outcome {
        Ok(samples) => {
            pb.finish_and_clear();
            samples
        }
        Err(e) => {
            pb.abandon();
            return Err(e);
        }
    };

    let result = CompilationResult::try_from(samples)?;

    info!(
        "Compiled {} samples in {}",
        result.len(),
        format_elapsed(start.elapsed())
    );
    Ok(result)
}

/// Keep every success or report the earliest failure in submission order
fn first_failure(outcomes: Vec<Result<SampleMutations>>) -> Result<Vec<SampleMutations>> {
    let mut samples = Vec::with_capacity(outcomes.len());
    let mut first_err = None;
    let mut failed = 0usize;

    for outcome in outcomes {
        match outcome {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                failed += 1;
                match e.source() {
                    Some(cause) => error!("{}: {}", e, cause),
                    None => error!("{}", e),
                }
                first_err.get_or_insert(e);
            }
        }
    }

    match first_err {
        Some(e) => {
            error!("{} of {} samples failed", failed, failed + samples.len());
            Err(e)
        }
        None => Ok(samples),
    }
}

fn worker_failure(path: &Path, naming: &dyn SampleNaming, source: MutationError) -> MutationError {
    let sample = naming.sample_id(path).unwrap_or_else(|_| {
        path.file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    });
    MutationError::WorkerFailure {
        sample,
        path: path.to_path_buf(),
        source: Box::new(source),
    }
}

/// Annotation files in `dir` whose name ends with `suffix`, sorted by name
pub fn discover_sample_files(dir: impl AsRef<Path>, suffix: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| MutationError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| MutationError::io(dir, e))?.path();
        let matches = path
            .file_name()
            .and_then(|f| f.to_str())
            .is_some_and(|name| name.ends_with(suffix));
        if matches && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(MutationError::NoSampleFiles {
            dir: dir.to_path_buf(),
            suffix: suffix.to_string(),
        });
    }

    files.sort();
    info!("Found {} annotation files in {}", files.len(), dir.display());
    Ok(files)
}
