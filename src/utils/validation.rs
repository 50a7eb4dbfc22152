use crate::utils::error::{FormError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(FormError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(FormError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extension(
    field_name: &str,
    file: &str,
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(FormError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(FormError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FormError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Every entry must be non-blank and appear only once.
pub fn validate_field_list(field_name: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(FormError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    let mut seen = HashSet::new();
    for value in values {
        validate_non_empty_string(field_name, value)?;
        if !seen.insert(value.as_str()) {
            return Err(FormError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: value.clone(),
                reason: "Duplicate entry".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("batch.input_dir", ".").is_ok());
        assert!(validate_path("batch.input_dir", "").is_err());
        assert!(validate_path("batch.input_dir", "a\0b").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("sheet.path", "inscriptions.xlsx", &["csv", "xlsx"]).is_ok());
        assert!(validate_file_extension("sheet.path", "INSCRIPTIONS.CSV", &["csv", "xlsx"]).is_ok());
        assert!(validate_file_extension("sheet.path", "notes.txt", &["csv", "xlsx"]).is_err());
        assert!(validate_file_extension("sheet.path", "noext", &["csv", "xlsx"]).is_err());
    }

    #[test]
    fn test_validate_field_list() {
        let fields = vec!["Nom".to_string(), "Prénom".to_string()];
        assert!(validate_field_list("validation.required_fields", &fields).is_ok());
        assert!(validate_field_list("validation.required_fields", &[]).is_err());

        let duplicated = vec!["Nom".to_string(), "Nom".to_string()];
        assert!(validate_field_list("validation.required_fields", &duplicated).is_err());

        let blank = vec!["  ".to_string()];
        assert!(validate_field_list("validation.required_fields", &blank).is_err());
    }
}
