use github_account_sync::error::{Result, SyncError};
use std::error::Error;
use std::time::Duration;

#[test]
fn test_error_display() {
    let error = SyncError::UpstreamError {
        status: 502,
        message: "Bad Gateway".to_string(),
    };
    assert_eq!(
        format!("{}", error),
        "GitHub API request failed with status 502: Bad Gateway"
    );

    let error = SyncError::StoreError("write failed".to_string());
    assert_eq!(format!("{}", error), "Storage error: write failed");

    let error = SyncError::ConfigError("missing token".to_string());
    assert_eq!(format!("{}", error), "Configuration error: missing token");

    let error = SyncError::Timeout(Duration::from_secs(30));
    assert_eq!(format!("{}", error), "Sync timed out after 30s");
}

#[test]
fn test_error_status() {
    let error = SyncError::UpstreamError {
        status: 404,
        message: "Not Found".to_string(),
    };
    assert_eq!(error.status(), Some(404));
    assert_eq!(SyncError::StoreError("x".to_string()).status(), None);
}

#[test]
fn test_error_source() {
    let error = SyncError::StoreError("x".to_string());
    assert!(error.source().is_none());

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: SyncError = json_error.into();
    assert!(error.source().is_some());
}

#[test]
fn test_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: SyncError = io_error.into();
    assert!(matches!(error, SyncError::IoError(_)));

    let url_error = url::Url::parse("not a url").unwrap_err();
    let error: SyncError = url_error.into();
    assert!(matches!(error, SyncError::UrlError(_)));
}

#[test]
fn test_result_type() {
    fn returns_result() -> Result<String> {
        Ok("success".to_string())
    }

    let result = returns_result();
    assert!(result.is_ok());
    assert_eq!(result.unwrap(), "success");

    fn returns_error() -> Result<String> {
        Err(SyncError::StoreError("Not found".to_string()))
    }

    assert!(returns_error().is_err());
}
