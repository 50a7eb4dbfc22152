use acroform_etl::config::BatchConfig;
use acroform_etl::core::reset::reset_workspace;
use acroform_etl::utils::{logger, validation::Validate};
use acroform_etl::LocalStorage;
use clap::Parser;

#[derive(Parser)]
#[command(name = "reset")]
#[command(about = "Move filed forms back to the input directory and delete generated outputs")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Directory holding the PDF forms (overrides batch.input_dir)
    #[arg(long)]
    dir: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose, false);

    let mut config = match &args.config {
        Some(path) => match BatchConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => BatchConfig::default(),
    };
    if let Some(dir) = args.dir {
        config.batch.input_dir = dir;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let storage = LocalStorage::new(config.batch.input_dir.clone());
    let summary = reset_workspace(&storage, &config).await?;

    println!(
        "✨ {} document(s) moved back, {} file(s) deleted",
        summary.moved, summary.deleted
    );
    if summary.failures > 0 {
        eprintln!("⚠️ {} file(s) could not be reset", summary.failures);
        std::process::exit(1);
    }
    Ok(())
}
