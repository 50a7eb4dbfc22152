use crate::domain::model::{ErrorReportEntry, FormRecord};
use chrono::NaiveDate;

/// State of one batch run, passed explicitly to every stage.
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub run_date: NaiveDate,
    /// Valid records with the file they came from, in processing order.
    pub records: Vec<(String, FormRecord)>,
    pub errors: Vec<ErrorReportEntry>,
    pub processed: usize,
    pub filing_failures: usize,
    pub json_outputs: Vec<String>,
}

impl BatchContext {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            run_date,
            records: Vec::new(),
            errors: Vec::new(),
            processed: 0,
            filing_failures: 0,
            json_outputs: Vec::new(),
        }
    }

    pub fn today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    pub fn record_error(&mut self, file: &str, message: impl Into<String>) {
        self.errors.push(ErrorReportEntry {
            file: file.to_string(),
            message: message.into(),
        });
    }

    /// Date stamp used in output file names.
    pub fn date_stamp(&self) -> String {
        self.run_date.format("%Y-%m-%d").to_string()
    }
}
