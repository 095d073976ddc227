/*!
 * Tests for error types
 */

use napisub::errors::{CatalogError, PayloadError, ProviderError};

/// Test retry classification of provider errors
#[test]
fn test_isRetryable_shouldSeparateTransientFailures() {
    assert!(ProviderError::Timeout("slow".into()).is_retryable());
    assert!(ProviderError::ConnectionError("reset".into()).is_retryable());
    assert!(ProviderError::ApiError { status_code: 503, message: String::new() }.is_retryable());
    assert!(ProviderError::ApiError { status_code: 429, message: String::new() }.is_retryable());

    assert!(!ProviderError::ApiError { status_code: 404, message: String::new() }.is_retryable());
    assert!(!ProviderError::Cancelled.is_retryable());
    assert!(!ProviderError::ParseError("bad".into()).is_retryable());
}

/// Test corruption classification of payload errors
#[test]
fn test_isCorruption_shouldExcludeMissingPayload() {
    assert!(PayloadError::Checksum { expected: 1, actual: 2 }.is_corruption());
    assert!(PayloadError::Decompress("bad".into()).is_corruption());
    assert!(PayloadError::Truncated(3).is_corruption());

    assert!(!PayloadError::NoPayload.is_corruption());
    assert!(!PayloadError::Envelope("bad".into()).is_corruption());
}

/// Test error messages
#[test]
fn test_display_shouldDescribeError() {
    let err = PayloadError::Checksum { expected: 0xdeadbeef, actual: 0x1 };
    assert_eq!(err.to_string(), "Checksum mismatch: stored deadbeef, computed 00000001");

    let err = ProviderError::ApiError { status_code: 500, message: "oops".into() };
    assert_eq!(err.to_string(), "Service responded with error: 500 - oops");

    let err = CatalogError::NoMatch("Skazani (1994)".into());
    assert_eq!(err.to_string(), "No catalog match for Skazani (1994)");
}

/// Provider errors convert into catalog errors with `?`
#[test]
fn test_catalogError_fromProvider_shouldKeepSource() {
    fn fails() -> Result<(), CatalogError> {
        let sent: Result<(), ProviderError> = Err(ProviderError::Timeout("t".into()));
        sent?;
        Ok(())
    }

    assert!(matches!(fails(), Err(CatalogError::Provider(ProviderError::Timeout(_)))));
}
