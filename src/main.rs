//! join-vcfs: streaming join of sorted VCF files
//!
//! Usage: join-vcfs <COMMAND> [OPTIONS]

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::info;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use join_vcfs::commands::{verify_sorted, JoinCommand};
use join_vcfs::error::{JoinError, Result};
use join_vcfs::genome::ChromOrder;
use join_vcfs::vcf::DEFAULT_PLOIDY;

#[derive(Parser)]
#[command(name = "join-vcfs")]
#[command(version)]
#[command(about = "Join sorted VCF files into bins of overlapping variants", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the chromosome processing order comes from.
#[derive(Args)]
#[group(required = false, multiple = false)]
struct ChromArgs {
    /// Comma separated chromosomes to process, in order (e.g. 1,2,X)
    #[arg(short = 'c', long)]
    chroms: Option<String>,

    /// Genome or .fai file; its first column gives the chromosome order
    #[arg(short = 'g', long)]
    genome: Option<PathBuf>,
}

impl ChromArgs {
    fn load(&self) -> Result<Option<ChromOrder>> {
        match (&self.chroms, &self.genome) {
            (Some(list), _) => Ok(Some(ChromOrder::parse_list(list))),
            (None, Some(path)) => ChromOrder::from_file(path).map(Some),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Merge VCF files into bins of overlapping variants
    Join {
        /// Input VCF files (repeat for each file)
        #[arg(short, long = "input", required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        order: ChromArgs,

        /// Ploidy reported for every input
        #[arg(long, default_value_t = DEFAULT_PLOIDY)]
        ploidy: u8,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print join statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Check that a VCF file is sorted
    Validate {
        /// Input VCF file
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        order: ChromArgs,
    },
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Join {
            inputs,
            order,
            ploidy,
            output,
            stats,
        } => run_join(inputs, order, ploidy, output, stats),
        Commands::Validate { input, order } => run_validate(input, order),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_join(
    inputs: Vec<PathBuf>,
    order: ChromArgs,
    ploidy: u8,
    output: Option<PathBuf>,
    stats: bool,
) -> Result<()> {
    let chromosomes = order.load()?.ok_or_else(|| {
        JoinError::Configuration(
            "a chromosome order is required: use --chroms or --genome".to_string(),
        )
    })?;

    let cmd = JoinCommand::new()
        .with_chromosomes(chromosomes)
        .with_ploidy(ploidy);

    let result = match output {
        Some(path) => {
            let mut file = File::create(&path)?;
            let result = cmd.run(&inputs, &mut file)?;
            file.flush()?;
            result
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            cmd.run(&inputs, &mut handle)?
        }
    };

    if stats {
        eprintln!("Join stats: {}", result);
    }
    info!(
        "joined {} files into {} bins",
        result.sources, result.bins_written
    );

    Ok(())
}

fn run_validate(input: PathBuf, order: ChromArgs) -> Result<()> {
    let order = order.load()?;
    let records = verify_sorted(&input, order.as_ref())?;
    info!("{}: {} records, sorted", input.display(), records);
    Ok(())
}
