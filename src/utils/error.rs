use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("PDF error: {0}")]
    PdfError(#[from] lopdf::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Could not load document '{file}': {message}")]
    DocumentLoadError { file: String, message: String },

    #[error("Could not read field '{field}': {message}")]
    FieldExtractionError { field: String, message: String },

    #[error("invalid data: missing required field(s): {}", missing.join(", "))]
    ValidationError { missing: Vec<String> },

    #[error("Could not move '{from}' to '{to}': {message}")]
    FilingError {
        from: String,
        to: String,
        message: String,
    },

    #[error("Spreadsheet reconciliation failed: {message}")]
    ReconciliationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    Output,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FormError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FormError::DocumentLoadError { .. }
            | FormError::FieldExtractionError { .. }
            | FormError::PdfError(_) => ErrorCategory::Input,
            FormError::ValidationError { .. } => ErrorCategory::Data,
            FormError::FilingError { .. }
            | FormError::ReconciliationError { .. }
            | FormError::ZipError(_)
            | FormError::CsvError(_)
            | FormError::XmlError(_)
            | FormError::SerializationError(_) => ErrorCategory::Output,
            FormError::ConfigError { .. }
            | FormError::InvalidConfigValueError { .. }
            | FormError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FormError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一欄位失敗只會讓該欄位變成空值
            FormError::FieldExtractionError { .. } | FormError::FilingError { .. } => {
                ErrorSeverity::Low
            }
            FormError::ValidationError { .. }
            | FormError::DocumentLoadError { .. }
            | FormError::PdfError(_) => ErrorSeverity::Medium,
            FormError::ReconciliationError { .. }
            | FormError::ZipError(_)
            | FormError::CsvError(_)
            | FormError::XmlError(_)
            | FormError::SerializationError(_) => ErrorSeverity::High,
            FormError::ConfigError { .. }
            | FormError::InvalidConfigValueError { .. }
            | FormError::MissingConfigError { .. }
            | FormError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FormError::DocumentLoadError { .. } | FormError::PdfError(_) => {
                "Check that the file is a readable, fillable PDF"
            }
            FormError::FieldExtractionError { .. } => {
                "Re-save the form with a PDF reader so that field values are written"
            }
            FormError::ValidationError { .. } => {
                "Fill in the missing fields and save the PDF with a reader that keeps form data"
            }
            FormError::FilingError { .. } => {
                "Close any program holding the file, then move it manually or run reset"
            }
            FormError::ReconciliationError { .. } => {
                "Close the spreadsheet in other programs and check the sheet name and header row"
            }
            FormError::ZipError(_) | FormError::XmlError(_) => {
                "Check that the workbook is a valid .xlsx file"
            }
            FormError::CsvError(_) => "Check that the sheet is valid CSV",
            FormError::SerializationError(_) => "Check the extracted data for unsupported values",
            FormError::ConfigError { .. }
            | FormError::InvalidConfigValueError { .. }
            | FormError::MissingConfigError { .. } => {
                "Fix the configuration file or command line arguments"
            }
            FormError::IoError(_) => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FormError::ValidationError { missing } => {
                format!("Missing required field(s): {}", missing.join(", "))
            }
            FormError::ReconciliationError { message } => {
                format!("The spreadsheet could not be updated: {}", message)
            }
            FormError::DocumentLoadError { file, .. } => {
                format!("The document '{}' could not be opened", file)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FormError>;
