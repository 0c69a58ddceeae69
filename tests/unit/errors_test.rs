use credvault::types::errors::*;

// === CodecError Tests ===

#[test]
fn codec_error_display_variants() {
    assert_eq!(
        CodecError::UnterminatedField(7).to_string(),
        "Unterminated quoted field at offset 7"
    );
    assert_eq!(
        CodecError::InvalidUtf8("bad byte".to_string()).to_string(),
        "Invalid UTF-8 in record: bad byte"
    );
}

// === CryptoError Tests ===

#[test]
fn crypto_error_display_variants() {
    assert_eq!(
        CryptoError::KeyProvider("locked".to_string()).to_string(),
        "Key provider unavailable: locked"
    );
    assert_eq!(
        CryptoError::MalformedBlob(3).to_string(),
        "Malformed encrypted blob: 3 bytes is too short"
    );
    assert!(CryptoError::Authentication
        .to_string()
        .starts_with("Authentication failed"));
}

// === RecordError Tests ===

#[test]
fn record_error_wraps_source() {
    use std::error::Error;

    let err: RecordError = CryptoError::Authentication.into();
    assert!(!err.is_key_provider());
    assert_eq!(
        err.source().map(|s| s.to_string()),
        Some(CryptoError::Authentication.to_string())
    );

    let err: RecordError = CryptoError::KeyProvider("gone".to_string()).into();
    assert!(err.is_key_provider());

    let err: RecordError = CodecError::InvalidUtf8("x".to_string()).into();
    assert_eq!(err.to_string(), "Record decode error: Invalid UTF-8 in record: x");
}

#[test]
fn schema_error_display() {
    let err = SchemaError::new("detail", 4, "invalid detail type");
    assert_eq!(
        err.to_string(),
        "Schema error in detail column 4: invalid detail type"
    );
}

// === StoreError Tests ===

#[test]
fn store_error_from_conversions() {
    let err: StoreError = CryptoError::Authentication.into();
    assert_eq!(err, StoreError::Record(RecordError::Crypto(CryptoError::Authentication)));

    let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, StoreError::DatabaseError(_)));
}

// === GateError / AnalysisError / SettingsError Tests ===

#[test]
fn gate_error_display_variants() {
    assert_eq!(
        GateError::NotEditable("builtin.length".to_string()).to_string(),
        "Quality gate is not editable: builtin.length"
    );
    assert_eq!(
        GateError::DuplicateId("custom.a".to_string()).to_string(),
        "Quality gate already exists: custom.a"
    );
}

#[test]
fn analysis_error_display_variants() {
    assert_eq!(
        AnalysisError::AlreadyRunning.to_string(),
        "Password analysis is already running"
    );
    assert_eq!(
        AnalysisError::Store("disk".to_string()).to_string(),
        "Password analysis store error: disk"
    );
}

#[test]
fn errors_implement_error_trait() {
    let errors: Vec<Box<dyn std::error::Error>> = vec![
        Box::new(CodecError::UnterminatedField(0)),
        Box::new(CryptoError::Authentication),
        Box::new(GateError::NotFound("x".to_string())),
        Box::new(StoreError::NotFound("x".to_string())),
        Box::new(AnalysisError::Cancelled),
        Box::new(SettingsError::InvalidKey("x".to_string())),
    ];
    for err in errors {
        assert!(!err.to_string().is_empty());
    }
}
