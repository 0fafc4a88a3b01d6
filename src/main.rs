use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wikimine::extract::{ExtractOptions, OutputPaths};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wikimine")]
#[command(about = "Mine Wikipedia dumps into page, category and biography tables")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract page, category and biography tables
    Extract(ExtractArgs),
    /// Export the first infobox of every article as JSON lines
    Infoboxes(InfoboxArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Path to the Wikipedia dump file (.xml or .xml.bz2)
    #[arg(short, long)]
    input: String,

    /// Output directory for generated tables
    #[arg(short, long)]
    output: String,

    /// Limit number of pages to process (for testing)
    #[arg(long)]
    limit: Option<u64>,

    /// Pages classified per parallel batch
    #[arg(long, default_value_t = wikimine::config::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Worker threads for classification (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Directory for the intermediate spool file (defaults to the system temp dir)
    #[arg(long)]
    spool_dir: Option<PathBuf>,

    /// Also write the inbound link count of every linked title
    #[arg(long)]
    link_counts: bool,
}

#[derive(Args)]
struct InfoboxArgs {
    /// Path to the Wikipedia dump file (.xml or .xml.bz2)
    #[arg(short, long)]
    input: String,

    /// Output JSON lines file
    #[arg(short, long)]
    output: PathBuf,

    /// Limit number of pages to process (for testing)
    #[arg(long)]
    limit: Option<u64>,
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory: {}", args.output))?;

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("wikimine-worker-{}", i))
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let mut paths = OutputPaths::in_dir(&args.output);
    if args.link_counts {
        paths = paths.with_link_counts(Path::new(&args.output).join("link_counts.tsv"));
    }
    let options = ExtractOptions {
        limit: args.limit,
        batch_size: args.batch_size,
        spool_dir: args.spool_dir,
    };

    info!("Starting extraction");
    let start = Instant::now();
    let stats = wikimine::extract::run_extraction(&args.input, &paths, &options)?;
    let duration = start.elapsed();
    info!(duration_secs = duration.as_secs_f64(), "Extraction complete");

    println!();
    println!("=== Summary ===");
    println!("Total time:          {:.2}s", duration.as_secs_f64());
    println!();
    println!("Pages read:          {}", stats.pages());
    println!("Articles written:    {}", stats.articles());
    println!("Uncategorized:       {}", stats.unclassified());
    println!("Categories written:  {}", stats.categories());
    println!("Biographies written: {}", stats.biographies());
    println!("Links counted:       {}", stats.links());
    println!("Pages ignored:       {}", stats.ignored());

    Ok(())
}

fn run_infoboxes(args: InfoboxArgs) -> Result<()> {
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let start = Instant::now();
    let stats = wikimine::extract::run_infobox_export(&args.input, &args.output, args.limit)?;

    println!();
    println!("=== Summary ===");
    println!("Total time:      {:.2}s", start.elapsed().as_secs_f64());
    println!("Articles read:   {}", stats.articles());
    println!("Infoboxes found: {}", stats.infoboxes());

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Infoboxes(args) => run_infoboxes(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
