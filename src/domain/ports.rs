use crate::core::context::BatchContext;
use crate::domain::model::{BatchSummary, FieldKind};
use crate::domain::sheet::Sheet;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::future::Future;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(&self, path: &str, data: &[u8]) -> impl Future<Output = Result<()>> + Send;
    fn remove_file(&self, path: &str) -> impl Future<Output = Result<()>> + Send;
}

pub trait DirectoryLister: Send + Sync {
    /// Names of the files in `dir` whose extension matches `extension`.
    /// A missing directory yields an empty list.
    fn list_files(
        &self,
        dir: &str,
        extension: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;
}

pub trait FileMover: Send + Sync {
    fn move_file(&self, from: &str, to: &str) -> impl Future<Output = Result<()>> + Send;
}

/// A parsed form document exposing its interactive fields.
pub trait FormDocument {
    /// Fully qualified field names, in document order.
    fn field_names(&self) -> Vec<String>;

    fn read_field(&self, name: &str) -> Result<FieldKind>;
}

pub trait DocumentLoader: Send + Sync {
    type Document: FormDocument;

    fn load(&self, bytes: &[u8]) -> Result<Self::Document>;
}

pub trait SheetStorage: Send + Sync {
    fn load_sheet(
        &self,
        path: &str,
        sheet_name: &str,
    ) -> impl Future<Output = Result<Sheet>> + Send;

    /// Persists `sheet` back to the file it was loaded from.
    fn save_sheet(&self, path: &str, sheet: &Sheet) -> impl Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn discover(&self) -> Result<Vec<String>>;
    async fn process_file(&self, ctx: &mut BatchContext, file: &str) -> Result<()>;
    async fn finish(&self, ctx: BatchContext) -> Result<BatchSummary>;
}
