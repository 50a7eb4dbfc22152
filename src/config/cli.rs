use crate::config::{BatchConfig, SheetTarget};
use crate::domain::model::OutputMode;
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputModeArg {
    Batch,
    PerFile,
}

impl From<OutputModeArg> for OutputMode {
    fn from(arg: OutputModeArg) -> Self {
        match arg {
            OutputModeArg::Batch => OutputMode::Batch,
            OutputModeArg::PerFile => OutputMode::PerFile,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "acroform-etl")]
#[command(about = "Extract PDF form fields into JSON and a spreadsheet")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory holding the PDF forms (overrides batch.input_dir)
    #[arg(long)]
    pub dir: Option<String>,

    /// Spreadsheet to append rows to, .csv or .xlsx (overrides sheet.path)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Worksheet name inside the spreadsheet (overrides sheet.name)
    #[arg(long)]
    pub sheet_name: Option<String>,

    /// JSON output layout (overrides output.mode)
    #[arg(long, value_enum)]
    pub output_mode: Option<OutputModeArg>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    /// List the forms that would be processed and exit
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// Loads the configuration file, if any, and applies command line overrides.
    pub fn resolve(&self) -> Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::from_file(path)?,
            None => BatchConfig::default(),
        };

        if let Some(dir) = &self.dir {
            config.batch.input_dir = dir.clone();
        }
        if let Some(mode) = self.output_mode {
            config.output.mode = mode.into();
        }
        if let Some(path) = &self.sheet {
            let name = config
                .sheet
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "Sheet1".to_string());
            config.sheet = Some(SheetTarget {
                path: path.clone(),
                name,
            });
        }
        if let (Some(name), Some(sheet)) = (&self.sheet_name, config.sheet.as_mut()) {
            sheet.name = name.clone();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_on_defaults() {
        let cli = CliConfig::parse_from([
            "acroform-etl",
            "--dir",
            "inbox",
            "--sheet",
            "inscriptions.xlsx",
            "--sheet-name",
            "Feuil1",
            "--output-mode",
            "per-file",
        ]);
        let config = cli.resolve().unwrap();
        assert_eq!(config.batch.input_dir, "inbox");
        assert_eq!(config.output.mode, OutputMode::PerFile);
        let sheet = config.sheet.unwrap();
        assert_eq!(sheet.path, "inscriptions.xlsx");
        assert_eq!(sheet.name, "Feuil1");
    }

    #[test]
    fn test_sheet_name_without_sheet_is_ignored() {
        let cli = CliConfig::parse_from(["acroform-etl", "--sheet-name", "Feuil1"]);
        let config = cli.resolve().unwrap();
        assert!(config.sheet.is_none());
    }
}
