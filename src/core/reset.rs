use crate::config::{join, BatchConfig};
use crate::domain::ports::{DirectoryLister, FileMover, Storage};
use crate::utils::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
    pub moved: usize,
    pub deleted: usize,
    pub failures: usize,
}

/// Extensions of the artifacts a batch run writes into the converted dir.
const ARTIFACT_EXTENSIONS: [&str; 2] = ["json", "txt"];

/// Undoes the filing of a previous run: documents in the converted and
/// errored directories go back to the input directory and the generated
/// JSON and report files are deleted.
pub async fn reset_workspace<S>(storage: &S, config: &BatchConfig) -> Result<ResetSummary>
where
    S: Storage + DirectoryLister + FileMover,
{
    let mut summary = ResetSummary::default();

    for dir in [&config.batch.converted_dir, &config.batch.errored_dir] {
        tracing::info!("📁 Processing ./{}/", dir);
        for file in storage.list_files(dir, &config.batch.extension).await? {
            match storage.move_file(&join(dir, &file), &file).await {
                Ok(()) => {
                    tracing::info!("  ✅ {} moved back to the input directory", file);
                    summary.moved += 1;
                }
                Err(e) => {
                    tracing::error!("  ❌ {}: {}", file, e);
                    summary.failures += 1;
                }
            }
        }
    }

    tracing::info!("🗑️ Removing generated JSON and report files");
    let converted = &config.batch.converted_dir;
    for extension in ARTIFACT_EXTENSIONS {
        for file in storage.list_files(converted, extension).await? {
            match storage.remove_file(&join(converted, &file)).await {
                Ok(()) => {
                    tracing::info!("  ✅ {} deleted", file);
                    summary.deleted += 1;
                }
                Err(e) => {
                    tracing::error!("  ❌ {}: {}", file, e);
                    summary.failures += 1;
                }
            }
        }
    }

    tracing::info!(
        "✨ Reset done: {} document(s) moved, {} file(s) deleted",
        summary.moved,
        summary.deleted
    );
    Ok(summary)
}
