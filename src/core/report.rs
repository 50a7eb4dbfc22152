use crate::config::OutputSection;
use crate::domain::model::{ErrorReportEntry, FormRecord};

/// One block per failed file: file line, message line, blank separator.
pub fn render_error_report(entries: &[ErrorReportEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.file);
        out.push('\n');
        out.push_str(&entry.message);
        out.push_str("\n\n");
    }
    out
}

pub fn batch_json_name(output: &OutputSection, date_stamp: &str) -> String {
    format!("{}_{}.json", output.batch_prefix, date_stamp)
}

pub fn error_report_name(output: &OutputSection, date_stamp: &str) -> String {
    format!("{}_{}.txt", output.report_prefix, date_stamp)
}

/// `<name fields joined by _>[_<date>].json`, with `/` in the date turned
/// into `-` and file-name-unsafe characters replaced.
pub fn per_file_json_name(output: &OutputSection, record: &FormRecord) -> String {
    let mut stem = output
        .name_fields
        .iter()
        .map(|field| record.text(field).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("_");

    if let Some(date) = output
        .date_field
        .as_deref()
        .and_then(|field| record.text(field))
        .filter(|date| !date.is_empty())
    {
        stem.push('_');
        stem.push_str(&date.replace('/', "-"));
    }

    format!("{}.json", sanitize_file_name(&stem))
}

pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('.').to_string();
    if cleaned.is_empty() {
        "record".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_blocks() {
        let entries = vec![
            ErrorReportEntry {
                file: "b.pdf".to_string(),
                message: "invalid data: missing required field(s): Nom".to_string(),
            },
            ErrorReportEntry {
                file: "c.pdf".to_string(),
                message: "Could not load document 'c.pdf': bad xref".to_string(),
            },
        ];
        assert_eq!(
            render_error_report(&entries),
            "b.pdf\ninvalid data: missing required field(s): Nom\n\n\
             c.pdf\nCould not load document 'c.pdf': bad xref\n\n"
        );
        assert_eq!(render_error_report(&[]), "");
    }

    #[test]
    fn test_output_names() {
        let output = OutputSection::default();
        assert_eq!(batch_json_name(&output, "2026-10-16"), "extraction_2026-10-16.json");
        assert_eq!(error_report_name(&output, "2026-10-16"), "errors_2026-10-16.txt");

        let record: FormRecord = vec![
            ("Nom", json!("Durand")),
            ("Prénom", json!("Alice")),
            ("Date3_af_date", json!("05/06/2002")),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            per_file_json_name(&output, &record),
            "Durand_Alice_05-06-2002.json"
        );

        let undated: FormRecord = vec![("Nom", json!("Du:rand")), ("Prénom", json!("Alice"))]
            .into_iter()
            .collect();
        assert_eq!(per_file_json_name(&output, &undated), "Du-rand_Alice.json");
    }
}
