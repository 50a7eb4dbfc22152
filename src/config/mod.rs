#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

use crate::domain::model::OutputMode;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_REQUIRED_FIELDS: [&str; 3] = ["Nom", "Prénom", "Date3_af_date"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub batch: BatchSection,
    pub validation: ValidationSection,
    pub output: OutputSection,
    pub sheet: Option<SheetTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    pub input_dir: String,
    pub extension: String,
    pub converted_dir: String,
    pub errored_dir: String,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            input_dir: ".".to_string(),
            extension: "pdf".to_string(),
            converted_dir: "converted".to_string(),
            errored_dir: "errored".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSection {
    pub required_fields: Vec<String>,
    /// Extra guidance logged when a given field is missing.
    pub hints: HashMap<String, String>,
}

impl Default for ValidationSection {
    fn default() -> Self {
        let mut hints = HashMap::new();
        hints.insert(
            "Date3_af_date".to_string(),
            "the PDF must be saved with a reader that keeps form data (e.g. Adobe Reader)"
                .to_string(),
        );
        Self {
            required_fields: DEFAULT_REQUIRED_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            hints,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub mode: OutputMode,
    pub batch_prefix: String,
    pub report_prefix: String,
    pub name_fields: Vec<String>,
    pub date_field: Option<String>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            mode: OutputMode::Batch,
            batch_prefix: "extraction".to_string(),
            report_prefix: "errors".to_string(),
            name_fields: vec!["Nom".to_string(), "Prénom".to_string()],
            date_field: Some("Date3_af_date".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetTarget {
    pub path: String,
    #[serde(default = "default_sheet_name")]
    pub name: String,
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

impl BatchConfig {
    /// Path of a file inside the converted directory, relative to the input dir.
    pub fn converted_path(&self, file: &str) -> String {
        join(&self.batch.converted_dir, file)
    }

    pub fn errored_path(&self, file: &str) -> String {
        join(&self.batch.errored_dir, file)
    }
}

pub(crate) fn join(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches(&['/', '\\'][..]);
    if dir.is_empty() || dir == "." {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

impl Validate for BatchConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("batch.input_dir", &self.batch.input_dir)?;
        validation::validate_path("batch.converted_dir", &self.batch.converted_dir)?;
        validation::validate_path("batch.errored_dir", &self.batch.errored_dir)?;
        validation::validate_non_empty_string("batch.extension", &self.batch.extension)?;
        validation::validate_field_list(
            "validation.required_fields",
            &self.validation.required_fields,
        )?;

        match self.output.mode {
            OutputMode::Batch => {
                validation::validate_non_empty_string(
                    "output.batch_prefix",
                    &self.output.batch_prefix,
                )?;
            }
            OutputMode::PerFile => {
                validation::validate_field_list("output.name_fields", &self.output.name_fields)?;
            }
        }
        validation::validate_non_empty_string("output.report_prefix", &self.output.report_prefix)?;

        if let Some(sheet) = &self.sheet {
            validation::validate_path("sheet.path", &sheet.path)?;
            validation::validate_file_extension("sheet.path", &sheet.path, &["csv", "xlsx"])?;
            validation::validate_non_empty_string("sheet.name", &sheet.name)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_signup_form() {
        let config = BatchConfig::default();
        assert_eq!(
            config.validation.required_fields,
            vec!["Nom", "Prénom", "Date3_af_date"]
        );
        assert_eq!(config.batch.converted_dir, "converted");
        assert_eq!(config.batch.errored_dir, "errored");
        assert_eq!(config.output.mode, OutputMode::Batch);
        assert!(config.sheet.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_destination_paths() {
        let config = BatchConfig::default();
        assert_eq!(config.converted_path("a.pdf"), "converted/a.pdf");
        assert_eq!(config.errored_path("a.pdf"), "errored/a.pdf");
        assert_eq!(join(".", "a.pdf"), "a.pdf");
        assert_eq!(join("out/", "a.pdf"), "out/a.pdf");
    }

    #[test]
    fn test_rejects_unsupported_sheet() {
        let config = BatchConfig {
            sheet: Some(SheetTarget {
                path: "inscriptions.ods".to_string(),
                name: "Feuil1".to_string(),
            }),
            ..BatchConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
