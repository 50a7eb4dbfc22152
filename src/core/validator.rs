use crate::domain::model::{FormRecord, ValidationOutcome};
use serde_json::Value;

/// Checks a record against a fixed, ordered set of required fields.
#[derive(Debug, Clone)]
pub struct RequiredFields {
    fields: Vec<String>,
}

impl RequiredFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Missing required fields, in declaration order. Every field is checked.
    pub fn missing(&self, record: &FormRecord) -> Vec<String> {
        self.fields
            .iter()
            .filter(|field| record.get(field).map_or(true, is_falsy))
            .cloned()
            .collect()
    }

    pub fn validate(&self, record: FormRecord) -> ValidationOutcome {
        let missing = self.missing(&record);
        if missing.is_empty() {
            ValidationOutcome::Valid(record)
        } else {
            ValidationOutcome::Invalid { record, missing }
        }
    }
}

pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0 || f.is_nan()),
        Value::Array(_) | Value::Object(_) => false,
    }
}
