use super::*;

#[test]
fn test_not_found_error() {
    let err = ConfigError::NotFound("indexsync.toml".to_string());
    assert!(err.to_string().contains("indexsync.toml"));
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_invalid_value_error() {
    let err = ConfigError::InvalidValue {
        field: "provider.kind".to_string(),
        message: "unknown provider".to_string(),
    };
    let display = err.to_string();
    assert!(display.contains("provider.kind"));
    assert!(display.contains("unknown provider"));
}

#[test]
fn test_env_var_not_set_error() {
    let err = ConfigError::EnvVarNotSet("GOOGLE_AI_API_KEY".to_string());
    assert!(err.to_string().contains("GOOGLE_AI_API_KEY"));
    assert!(err.to_string().contains("not set"));
}

#[test]
fn test_io_error_from() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err = ConfigError::from(io_err);
    assert!(err.to_string().contains("file not found"));
}
