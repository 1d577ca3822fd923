use std::io;

use cloney::error::{Error, ValidationError, ValidationErrors};

#[test]
fn test_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();

    match err {
        Error::IoError(_) => (),
        _ => panic!("Expected IoError variant"),
    }
}

#[test]
fn test_error_display() {
    let err = Error::MissingVariableError { name: "app_name".to_string() };
    assert_eq!(err.to_string(), "Required variable 'app_name' is not defined.");

    let err = Error::VariableTypeError {
        name: "port".to_string(),
        actual: "string".to_string(),
        required: "integer".to_string(),
    };
    assert_eq!(err.to_string(), "Variable 'port' is of type 'string' but must be of type 'integer'.");

    let err = Error::SchemaValidationError(ValidationErrors(vec![ValidationError::InvalidSemver {
        field: "template_version",
        value: "1.0".to_string(),
    }]));
    assert_eq!(
        err.to_string(),
        "The template manifest is invalid:\n- Invalid semantic version '1.0' for field template_version"
    );
}
