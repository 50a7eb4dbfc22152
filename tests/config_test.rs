use acroform_etl::domain::model::OutputMode;
use acroform_etl::utils::error::FormError;
use acroform_etl::utils::validation::Validate;
use acroform_etl::BatchConfig;
use tempfile::TempDir;

#[test]
fn test_config_file_with_env_substitution() {
    std::env::set_var("ACROFORM_ETL_TEST_DIR", "/srv/inscriptions");

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("acroform-etl.toml");
    std::fs::write(
        &path,
        r#"
[batch]
input_dir = "${ACROFORM_ETL_TEST_DIR}"

[validation]
required_fields = ["Nom", "Email"]

[validation.hints]
Email = "check the contact page"

[output]
mode = "per-file"
name_fields = ["Nom"]

[sheet]
path = "suivi.xlsx"
name = "Inscriptions"
"#,
    )
    .unwrap();

    let config = BatchConfig::from_file(&path).unwrap();

    assert_eq!(config.batch.input_dir, "/srv/inscriptions");
    assert_eq!(config.batch.converted_dir, "converted");
    assert_eq!(config.validation.required_fields, vec!["Nom", "Email"]);
    assert_eq!(
        config.validation.hints.get("Email").map(String::as_str),
        Some("check the contact page")
    );
    assert_eq!(config.output.mode, OutputMode::PerFile);
    assert_eq!(config.output.batch_prefix, "extraction");
    assert_eq!(config.sheet.as_ref().unwrap().name, "Inscriptions");
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_sheet_extension_is_rejected() {
    let config = BatchConfig::from_toml_str(
        r#"
[sheet]
path = "suivi.ods"
"#,
    )
    .unwrap();

    assert!(matches!(
        config.validate(),
        Err(FormError::InvalidConfigValueError { .. })
    ));
}

#[test]
fn test_missing_config_file() {
    let err = BatchConfig::from_file("/nonexistent/acroform-etl.toml").unwrap_err();
    assert!(matches!(err, FormError::IoError(_)));
}
