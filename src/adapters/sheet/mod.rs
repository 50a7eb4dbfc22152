pub mod delimited;
pub mod xlsx;

use crate::core::SheetStorage;
use crate::domain::sheet::Sheet;
use crate::utils::error::{FormError, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Xlsx,
}

impl SheetFormat {
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(SheetFormat::Csv),
            Some("xlsx") => Ok(SheetFormat::Xlsx),
            _ => Err(FormError::InvalidConfigValueError {
                field: "sheet.path".to_string(),
                value: path.to_string(),
                reason: "expected a .xlsx or .csv file".to_string(),
            }),
        }
    }
}

/// Spreadsheets on the local filesystem, picked by file extension.
#[derive(Debug, Clone)]
pub struct LocalSheetStorage {
    base_path: String,
}

impl LocalSheetStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl SheetStorage for LocalSheetStorage {
    async fn load_sheet(&self, path: &str, sheet_name: &str) -> Result<Sheet> {
        let format = SheetFormat::from_path(path)?;
        let bytes = tokio::fs::read(self.resolve(path)).await?;
        tracing::debug!("Loaded sheet file {} ({} bytes)", path, bytes.len());

        match format {
            SheetFormat::Csv => delimited::read_sheet(&bytes, sheet_name),
            SheetFormat::Xlsx => xlsx::read_sheet(&bytes, sheet_name),
        }
    }

    async fn save_sheet(&self, path: &str, sheet: &Sheet) -> Result<()> {
        let full_path = self.resolve(path);
        let bytes = match SheetFormat::from_path(path)? {
            SheetFormat::Csv => delimited::write_sheet(sheet)?,
            SheetFormat::Xlsx => {
                let original = tokio::fs::read(&full_path).await?;
                xlsx::write_sheet(&original, sheet)?
            }
        };
        tokio::fs::write(&full_path, bytes).await?;
        tracing::debug!("Saved sheet '{}' to {}", sheet.name, path);
        Ok(())
    }
}
