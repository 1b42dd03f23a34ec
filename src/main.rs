use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use color_eyre::Result;

use phasekit::phase::{self, PhaseConfig, PhasingTool};
use phasekit::resources::ResourceRegistry;
use phasekit::switch::{self, SwitchConfig};

/// Orchestration of external phasing tools over the autosomes
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "A wrapper pipeline to phase genotypes and check phasing accuracy"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Phase the autosomes of a vcf.gz file with an external phasing tool
    Phase(PhaseArgs),
    /// Estimate the switch error between pairs of phased vcf.gz files
    SwitchError(SwitchErrorArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SharedOptions {
    /// path/to/file.csv mapping tool and reference names to paths
    #[arg(short = 'r', long = "res-file", required = true)]
    pub res_file: Utf8PathBuf,

    /// Number of worker threads, also passed to tools that accept one
    #[arg(short = 'c', long = "threads", default_value_t = 22)]
    pub threads: usize,
}

impl SharedOptions {
    /// Initialize thread pool
    pub fn initialize_threading(&self) -> Result<()> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build_global()?;
        Ok(())
    }
}

/// Phase the autosomes of a vcf.gz file with an external phasing tool
#[derive(Args, Debug)]
pub struct PhaseArgs {
    /// path/to/filename.vcf.gz with the genetic variants to phase
    #[arg(required = true)]
    pub vcfgz_file: Utf8PathBuf,

    /// The tool to phase the genotypes: shapeit, eagle or beagle
    #[arg(short = 't', long = "tool", default_value = "shapeit")]
    pub tool: String,

    /// Shared options
    #[command(flatten)]
    pub shared: SharedOptions,
}

impl PhaseArgs {
    pub fn run(self) -> Result<()> {
        // Reject an unknown tool before any work is dispatched.
        let tool: PhasingTool = self.tool.parse()?;

        self.shared.initialize_threading()?;
        let resources = ResourceRegistry::from_file(&self.shared.res_file)?;

        phase::run(
            tool,
            PhaseConfig {
                input_vcf: self.vcfgz_file,
                resources,
                threads: self.shared.threads,
            },
        )
    }
}

/// Estimate the switch error between pairs of phased vcf.gz files
#[derive(Args, Debug)]
pub struct SwitchErrorArgs {
    /// path/to/table.txt, space delimited: <vcf1> <vcf2> <sample_id>
    #[arg(required = true)]
    pub table: Utf8PathBuf,

    /// Directory the per-sample vcftools outputs are written to
    #[arg(required = true)]
    pub out_dir: Utf8PathBuf,

    /// Shared options
    #[command(flatten)]
    pub shared: SharedOptions,
}

impl SwitchErrorArgs {
    pub fn run(self) -> Result<()> {
        self.shared.initialize_threading()?;
        let resources = ResourceRegistry::from_file(&self.shared.res_file)?;

        switch::run(SwitchConfig {
            table: self.table,
            out_dir: self.out_dir,
            resources,
        })
    }
}

// Main entry point
pub fn main() -> Result<()> {
    color_eyre::install()?;
    use env_logger::Env;

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Phase(args) => args.run(),
        Commands::SwitchError(args) => args.run(),
    }
}
