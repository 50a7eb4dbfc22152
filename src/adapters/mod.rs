// Adapters layer: concrete implementations of the domain ports.

pub mod pdf;
pub mod sheet;
pub mod storage;

pub use pdf::{PdfForm, PdfFormLoader};
pub use sheet::LocalSheetStorage;
pub use storage::LocalStorage;
