use crate::core::context::BatchContext;
use crate::core::Pipeline;
use crate::domain::model::BatchSummary;
use crate::utils::error::Result;

pub struct BatchEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> BatchEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Processes every discovered file in sequence, then finishes the batch.
    pub async fn run(&self, mut ctx: BatchContext) -> Result<BatchSummary> {
        tracing::info!("🚀 Starting batch extraction");

        let files = self.pipeline.discover().await?;
        if files.is_empty() {
            tracing::warn!("⚠️ No input files found");
        }

        for file in &files {
            self.pipeline.process_file(&mut ctx, file).await?;
        }

        let summary = self.pipeline.finish(ctx).await?;

        tracing::info!(
            "📊 {} processed, {} converted, {} errored, {} left in place",
            summary.processed,
            summary.converted,
            summary.errored,
            summary.filing_failures
        );

        Ok(summary)
    }
}
