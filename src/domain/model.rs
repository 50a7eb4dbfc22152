use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Values extracted from one form document, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormRecord {
    pub data: Map<String, Value>,
}

impl FormRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value and returns whether the key is new. A repeated key keeps
    /// its original position and takes the latest value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> bool {
        self.data.insert(key.into(), value).is_none()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Text rendering of a value, used for file names and reports.
    pub fn text(&self, key: &str) -> Option<String> {
        self.data.get(key).map(value_to_text)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FormRecord {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = FormRecord::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// The finite set of interactive field kinds a form can hold, each carrying
/// the raw state read from the document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text(Option<String>),
    CheckBox { checked: bool },
    RadioGroup { selected: Option<String> },
    Dropdown { selected: Vec<String> },
    OptionList { selected: Vec<String> },
    Other,
}

impl FieldKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldKind::Text(_) => "text",
            FieldKind::CheckBox { .. } => "checkbox",
            FieldKind::RadioGroup { .. } => "radio-group",
            FieldKind::Dropdown { .. } => "dropdown",
            FieldKind::OptionList { .. } => "option-list",
            FieldKind::Other => "other",
        }
    }

    /// Scalar value stored in the record for this field.
    pub fn into_value(self) -> Value {
        match self {
            FieldKind::Text(text) => match text {
                Some(text) if text != "undefined" => Value::String(text),
                _ => Value::String(String::new()),
            },
            FieldKind::CheckBox { checked } => Value::Bool(checked),
            FieldKind::RadioGroup { selected } => Value::String(selected.unwrap_or_default()),
            FieldKind::Dropdown { selected } | FieldKind::OptionList { selected } => {
                Value::String(selected.into_iter().next().unwrap_or_default())
            }
            FieldKind::Other => Value::String(String::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(FormRecord),
    Invalid {
        record: FormRecord,
        missing: Vec<String>,
    },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReportEntry {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// One dated JSON array for the whole run.
    #[default]
    Batch,
    /// One JSON object per valid document, named after the record.
    PerFile,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub converted: usize,
    pub errored: usize,
    pub filing_failures: usize,
    pub appended_rows: Option<usize>,
    pub json_outputs: Vec<String>,
    pub error_report: Option<String>,
}
