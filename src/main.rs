use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webp_ingest::ingest::{self, Steps};
use webp_ingest::{config, output};

#[derive(clap::Args, Clone)]
struct PathArgs {
    /// Image files or directories (walked recursively)
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[derive(Parser)]
#[command(name = "webp-ingest")]
#[command(about = "Resize uploaded JPEG/PNG images in place and write WebP copies")]
#[command(long_about = "\
Resize uploaded JPEG/PNG images in place and write WebP copies

For every JPEG or PNG (detected by content, not extension):

  photo.jpg   4000x2000  →  photo.jpg   1500x750   (resize, in place)
  photo.jpg              →  photo.webp             (convert, sibling file)

Existing .webp files are never overwritten. Other formats are skipped.

Logging goes to stderr; set RUST_LOG (e.g. RUST_LOG=webp_ingest=debug) for
more detail. Run 'webp-ingest gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Print the run report as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Shrink oversized images in place
    Resize(PathArgs),
    /// Write a .webp next to each image
    Convert(PathArgs),
    /// Resize, then convert: the full upload pipeline
    Ingest(PathArgs),
    /// Print a stock webp-ingest.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webp_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (steps, args) = match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        Command::Resize(args) => (Steps::RESIZE, args),
        Command::Convert(args) => (Steps::CONVERT, args),
        Command::Ingest(args) => (Steps::ALL, args),
    };

    let cfg = config::load_config(&cli.config)?;
    init_thread_pool(&cfg.processing);

    let summary = if cli.json {
        let summary = ingest::ingest(&args.paths, steps, &cfg.images, None)?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        summary
    } else {
        let (tx, rx) = std::sync::mpsc::channel();
        let printer = std::thread::spawn(move || {
            for event in rx {
                output::print_ingest_event(&event);
            }
        });
        let summary = ingest::ingest(&args.paths, steps, &cfg.images, Some(tx))?;
        printer.join().map_err(|_| "output thread panicked")?;
        output::print_summary(&summary);
        summary
    };

    if summary.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
