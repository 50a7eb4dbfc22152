use crate::config::BatchConfig;
use crate::core::context::BatchContext;
use crate::core::extractor::extract_record;
use crate::core::reconciler::SheetReconciler;
use crate::core::report;
use crate::core::validator::RequiredFields;
use crate::domain::model::{BatchSummary, FormRecord, OutputMode, ValidationOutcome};
use crate::domain::ports::{
    DirectoryLister, DocumentLoader, FileMover, Pipeline, SheetStorage, Storage,
};
use crate::utils::error::{FormError, Result};
use std::sync::Arc;

/// Drives each form through extraction and validation, files it, then
/// writes the batch artifacts and updates the spreadsheet once.
pub struct FormPipeline<S, L, W>
where
    S: Storage + DirectoryLister + FileMover,
    L: DocumentLoader,
    W: SheetStorage,
{
    storage: S,
    loader: L,
    sheets: W,
    config: Arc<BatchConfig>,
    required: RequiredFields,
}

impl<S, L, W> FormPipeline<S, L, W>
where
    S: Storage + DirectoryLister + FileMover,
    L: DocumentLoader,
    W: SheetStorage,
{
    pub fn new(storage: S, loader: L, sheets: W, config: Arc<BatchConfig>) -> Self {
        let required = RequiredFields::new(config.validation.required_fields.iter().cloned());
        Self {
            storage,
            loader,
            sheets,
            config,
            required,
        }
    }

    /// Reads and parses the document, then extracts its fields. The parsed
    /// document is dropped before this returns, so the file can be moved.
    async fn extract(&self, file: &str) -> Result<FormRecord> {
        let bytes = self
            .storage
            .read_file(file)
            .await
            .map_err(|e| load_error(file, e))?;

        let record = {
            let doc = self.loader.load(&bytes).map_err(|e| load_error(file, e))?;
            extract_record(&doc)
        };

        tracing::debug!("Extracted {} field(s) from {}", record.len(), file);
        Ok(record)
    }

    async fn write_record_json(&self, ctx: &mut BatchContext, record: &FormRecord) -> Result<()> {
        let name = report::per_file_json_name(&self.config.output, record);
        let path = self.config.converted_path(&name);
        let json = serde_json::to_string_pretty(record)?;
        self.storage.write_file(&path, json.as_bytes()).await?;
        tracing::info!("✅ JSON file created: {}", name);
        ctx.json_outputs.push(path);
        Ok(())
    }

    /// A failed move is logged and counted; the file stays where it is.
    async fn file_into(&self, ctx: &mut BatchContext, file: &str, destination: &str) {
        match self.storage.move_file(file, destination).await {
            Ok(()) => tracing::info!("📁 {} moved to ./{}", file, destination),
            Err(e) => {
                ctx.filing_failures += 1;
                tracing::warn!("🚨 Could not move {} automatically (file locked?): {}", file, e);
            }
        }
    }

    fn log_missing(&self, missing: &[String]) {
        for field in missing {
            match self.config.validation.hints.get(field) {
                Some(hint) => tracing::warn!("⚠️ {} missing ({})", field, hint),
                None => tracing::warn!("⚠️ {} missing", field),
            }
        }
    }

    async fn fail(&self, ctx: &mut BatchContext, file: &str, error: FormError) {
        ctx.record_error(file, error.to_string());
        let destination = self.config.errored_path(file);
        self.file_into(ctx, file, &destination).await;
    }
}

fn load_error(file: &str, source: FormError) -> FormError {
    match source {
        FormError::DocumentLoadError { message, .. } => FormError::DocumentLoadError {
            file: file.to_string(),
            message,
        },
        other => FormError::DocumentLoadError {
            file: file.to_string(),
            message: other.to_string(),
        },
    }
}

#[async_trait::async_trait]
impl<S, L, W> Pipeline for FormPipeline<S, L, W>
where
    S: Storage + DirectoryLister + FileMover,
    L: DocumentLoader,
    W: SheetStorage,
{
    async fn discover(&self) -> Result<Vec<String>> {
        let files = self
            .storage
            .list_files(".", &self.config.batch.extension)
            .await?;
        tracing::info!("🔎 Files found: {:?}", files);
        Ok(files)
    }

    async fn process_file(&self, ctx: &mut BatchContext, file: &str) -> Result<()> {
        ctx.processed += 1;
        tracing::info!("📄 Processing {}", file);

        let record = match self.extract(file).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("🚨 Extraction failed for {}: {}", file, e);
                self.fail(ctx, file, e).await;
                return Ok(());
            }
        };

        tracing::debug!("Validating {}", file);
        match self.required.validate(record) {
            ValidationOutcome::Valid(record) => {
                if self.config.output.mode == OutputMode::PerFile {
                    if let Err(e) = self.write_record_json(ctx, &record).await {
                        tracing::error!("🚨 Could not write JSON for {}: {}", file, e);
                        self.fail(ctx, file, e).await;
                        return Ok(());
                    }
                }
                tracing::info!("✅ Validation passed for {}", file);
                ctx.records.push((file.to_string(), record));
                let destination = self.config.converted_path(file);
                self.file_into(ctx, file, &destination).await;
            }
            ValidationOutcome::Invalid { missing, .. } => {
                self.log_missing(&missing);
                let error = FormError::ValidationError { missing };
                tracing::error!("🚨 {}: {}", file, error);
                self.fail(ctx, file, error).await;
            }
        }

        Ok(())
    }

    async fn finish(&self, ctx: BatchContext) -> Result<BatchSummary> {
        let date_stamp = ctx.date_stamp();
        let records: Vec<FormRecord> = ctx.records.iter().map(|(_, r)| r.clone()).collect();

        let mut summary = BatchSummary {
            processed: ctx.processed,
            converted: ctx.records.len(),
            errored: ctx.errors.len(),
            filing_failures: ctx.filing_failures,
            appended_rows: None,
            json_outputs: ctx.json_outputs.clone(),
            error_report: None,
        };

        if self.config.output.mode == OutputMode::Batch {
            let name = report::batch_json_name(&self.config.output, &date_stamp);
            let path = self.config.converted_path(&name);
            let written = match serde_json::to_string_pretty(&records) {
                Ok(json) => self.storage.write_file(&path, json.as_bytes()).await,
                Err(e) => Err(e.into()),
            };
            match written {
                Ok(()) => {
                    tracing::info!("✅ {} record(s) written to {}", records.len(), path);
                    summary.json_outputs.push(path);
                }
                Err(e) => tracing::error!("🚨 Could not write {}: {}", path, e),
            }
        }

        match &self.config.sheet {
            Some(target) => {
                match SheetReconciler::new(&self.sheets)
                    .reconcile(&target.path, &target.name, &records)
                    .await
                {
                    Ok(result) => {
                        tracing::info!(
                            "✅ {} row(s) appended to {} [{}]",
                            result.appended,
                            target.path,
                            target.name
                        );
                        summary.appended_rows = Some(result.appended);
                    }
                    Err(e) => {
                        tracing::error!("🚨 {}", e);
                        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
                    }
                }
            }
            None => tracing::info!("No spreadsheet configured, skipping sheet update"),
        }

        if !ctx.errors.is_empty() {
            let name = report::error_report_name(&self.config.output, &date_stamp);
            let path = self.config.converted_path(&name);
            let text = report::render_error_report(&ctx.errors);
            match self.storage.write_file(&path, text.as_bytes()).await {
                Ok(()) => {
                    tracing::info!("📝 Error report written to {}", path);
                    summary.error_report = Some(path);
                }
                Err(e) => tracing::error!("🚨 Could not write {}: {}", path, e),
            }
            for entry in &ctx.errors {
                tracing::warn!("❌ {}: {}", entry.file, entry.message);
            }
        }

        Ok(summary)
    }
}
