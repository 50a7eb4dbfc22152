pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{LocalSheetStorage, LocalStorage, PdfFormLoader};
pub use config::BatchConfig;
pub use crate::core::{context::BatchContext, engine::BatchEngine, pipeline::FormPipeline};
pub use utils::error::{FormError, Result};
