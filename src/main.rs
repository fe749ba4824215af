use anyhow::{bail, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use muggwas::compile::resolver::Mode;
use muggwas::compile::scheduler::CompileConfig;
use muggwas::compile::{run_compile, SampleInput};
use muggwas::core::sample_name::{DottedField, DEFAULT_ANNOTATION_SUFFIX};
use std::path::PathBuf;

/// Gene mutation matrices for bacterial GWAS
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Compile per-gene mutation calls from annotated variants into a gene-by-sample matrix"
)]
pub struct Cli {
    /// Print the full command reference as markdown
    #[arg(long = "markdown-help", hide = true)]
    pub markdown_help: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile annotated variant files into a gene mutation matrix
    Compile(CompileArgs),
    /// Convert a gene mutation matrix into a 0/1 presence table
    Presence(PresenceArgs),
    /// Rename every contig in a VCF to a single name
    RenameContigs(RenameArgs),
}

/// Compile annotated variant files into a gene mutation matrix
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// GFF3 file with the reference gene features
    #[arg(short = 'f', long = "features", required = true)]
    pub features: PathBuf,

    /// Per-sample exonic variant function files
    #[arg(required_unless_present = "annotation_dir", conflicts_with = "annotation_dir")]
    pub input: Vec<PathBuf>,

    /// Directory to search for per-sample annotation files
    #[arg(short = 'd', long = "annotation-dir")]
    pub annotation_dir: Option<PathBuf>,

    /// File name suffix that marks an annotation file
    #[arg(long = "suffix", default_value = DEFAULT_ANNOTATION_SUFFIX)]
    pub suffix: String,

    /// Output path for the gene mutation matrix
    #[arg(short = 'o', long = "output", required = true)]
    pub output: PathBuf,

    /// Category vocabulary for matrix cells
    #[arg(short = 'm', long = "mode", value_enum, default_value_t = Mode::Binary)]
    pub mode: Mode,

    /// Number of worker threads (defaults to all available cores)
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Attempt every sample before reporting failures
    #[arg(long = "keep-going")]
    pub keep_going: bool,
}

/// Convert a gene mutation matrix into a 0/1 presence table
#[derive(Args, Debug)]
pub struct PresenceArgs {
    /// Gene mutation matrix written by `compile`
    #[arg(required = true)]
    pub matrix: PathBuf,

    /// Output path (defaults to <matrix stem>_filtered_numeric.txt)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

/// Rename every contig in a VCF to a single name
#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Input VCF, plain or bgzipped
    #[arg(short = 'i', long = "input", required = true)]
    pub input: PathBuf,

    /// Output VCF, bgzipped when the name ends in .gz
    #[arg(short = 'o', long = "output", required = true)]
    pub output: PathBuf,

    /// New contig name
    #[arg(short = 'c', long = "contig", required = true)]
    pub contig: String,
}

impl CompileArgs {
    pub fn run(self) -> Result<()> {
        if self.threads == Some(0) {
            bail!("--threads must be at least 1");
        }

        let input = match self.annotation_dir {
            Some(dir) => SampleInput::Directory {
                dir,
                suffix: self.suffix.clone(),
            },
            None => SampleInput::Files(self.input),
        };
        let config = CompileConfig {
            mode: self.mode,
            workers: self.threads,
            fail_fast: !self.keep_going,
        };
        let naming = DottedField::with_suffix(self.suffix);

        run_compile(&self.features, input, &self.output, &config, &naming).with_context(|| {
            format!(
                "Failed to compile gene mutation matrix {}",
                self.output.display()
            )
        })?;
        Ok(())
    }
}

impl PresenceArgs {
    pub fn run(self) -> Result<()> {
        use muggwas::presence::{default_output_path, to_presence};

        let output = self
            .output
            .unwrap_or_else(|| default_output_path(&self.matrix));
        to_presence(&self.matrix, &output)
            .with_context(|| format!("Failed to convert {}", self.matrix.display()))?;
        Ok(())
    }
}

impl RenameArgs {
    pub fn run(self) -> Result<()> {
        use muggwas::rename::rename_contigs;

        if self.contig.is_empty() || self.contig.contains(char::is_whitespace) {
            bail!("Contig name must be non-empty and contain no whitespace");
        }
        rename_contigs(&self.input, &self.output, &self.contig)
            .with_context(|| format!("Failed to rename contigs in {}", self.input.display()))?;
        Ok(())
    }
}

// Main entry point
pub fn main() -> Result<()> {
    use env_logger::Env;

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    match cli.command {
        Some(Commands::Compile(args)) => args.run(),
        Some(Commands::Presence(args)) => args.run(),
        Some(Commands::RenameContigs(args)) => args.run(),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
