use acroform_etl::core::DirectoryLister;
use acroform_etl::utils::error::{ErrorSeverity, FormError};
use acroform_etl::utils::{logger, validation::Validate};
use acroform_etl::{
    BatchConfig, BatchContext, BatchEngine, CliConfig, FormPipeline, LocalSheetStorage,
    LocalStorage, PdfFormLoader,
};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose, cli.log_json);

    tracing::info!("Starting acroform-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    display_config_summary(&config);

    let storage = LocalStorage::new(config.batch.input_dir.clone());

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be moved or written");
        let files = storage
            .list_files(".", &config.batch.extension)
            .await?;
        println!("{} file(s) would be processed:", files.len());
        for file in &files {
            println!("  📄 {}", file);
        }
        return Ok(());
    }

    let sheets = LocalSheetStorage::new(config.batch.input_dir.clone());
    let pipeline = FormPipeline::new(storage, PdfFormLoader, sheets, Arc::new(config));
    let engine = BatchEngine::new(pipeline);

    match engine.run(BatchContext::today()).await {
        Ok(summary) => {
            println!(
                "✅ {} processed, {} converted, {} errored",
                summary.processed, summary.converted, summary.errored
            );
            if let Some(rows) = summary.appended_rows {
                println!("📊 {} row(s) appended to the sheet", rows);
            }
            for output in &summary.json_outputs {
                println!("📁 {}", output);
            }
            if let Some(report) = &summary.error_report {
                println!("📁 Error report: {}", report);
            }
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

fn display_config_summary(config: &BatchConfig) {
    tracing::info!("📋 Configuration:");
    tracing::info!("  📁 Input directory: {}", config.batch.input_dir);
    tracing::info!(
        "  📁 Converted: {}, errored: {}",
        config.batch.converted_dir,
        config.batch.errored_dir
    );
    tracing::info!(
        "  ✔️ Required fields: {}",
        config.validation.required_fields.join(", ")
    );
    tracing::info!("  📝 Output mode: {:?}", config.output.mode);
    match &config.sheet {
        Some(sheet) => tracing::info!("  📊 Sheet: {} [{}]", sheet.path, sheet.name),
        None => tracing::info!("  📊 Sheet: none"),
    }
}

fn exit_with(e: FormError) -> ! {
    tracing::error!(
        "❌ Batch failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
