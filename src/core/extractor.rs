use crate::domain::model::FormRecord;
use crate::domain::ports::FormDocument;
use serde_json::Value;

/// Reads every field of `doc` into a record. A field that cannot be read is
/// logged and stored as empty text; the remaining fields are still extracted.
pub fn extract_record<D: FormDocument + ?Sized>(doc: &D) -> FormRecord {
    let mut record = FormRecord::new();

    for name in doc.field_names() {
        let value = match doc.read_field(&name) {
            Ok(kind) => {
                tracing::trace!("Field '{}' ({})", name, kind.kind_name());
                kind.into_value()
            }
            Err(e) => {
                tracing::warn!("⚠️ Error on field {}: {}", name, e);
                Value::String(String::new())
            }
        };

        if !record.insert(name.clone(), value) {
            tracing::debug!("Duplicate field name '{}', keeping the last value", name);
        }
    }

    record
}
