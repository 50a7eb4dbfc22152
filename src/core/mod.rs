pub mod context;
pub mod engine;
pub mod extractor;
pub mod header;
pub mod pipeline;
pub mod reconciler;
pub mod report;
pub mod reset;
pub mod validator;

pub use crate::domain::model::{FormRecord, ValidationOutcome};
pub use crate::domain::ports::{
    DirectoryLister, DocumentLoader, FileMover, FormDocument, Pipeline, SheetStorage, Storage,
};
pub use crate::utils::error::Result;
