use super::*;

#[test]
fn display_includes_category_and_message() {
    let err = Error::TypeMismatch("'Roughness' is Float, cannot re-set as Int".to_string());
    let text = format!("{}", err);
    assert!(text.starts_with("Type mismatch:"));
    assert!(text.contains("Roughness"));
}

#[test]
fn display_covers_every_variant() {
    let variants = [
        Error::TypeMismatch("t".to_string()),
        Error::SizeMismatch("s".to_string()),
        Error::CompileFailure("c".to_string()),
        Error::MissingResource("m".to_string()),
        Error::BackendError("b".to_string()),
        Error::InitializationFailed("i".to_string()),
    ];
    for err in variants {
        assert!(!format!("{}", err).is_empty());
    }
}

#[test]
fn engine_err_builds_backend_error() {
    let err = crate::engine_err!("hydra::Test", "lost {} things", 3);
    match err {
        Error::BackendError(msg) => assert_eq!(msg, "lost 3 things"),
        other => panic!("expected BackendError, got {:?}", other),
    }
}

#[test]
fn engine_bail_returns_early() {
    fn failing() -> Result<u32> {
        crate::engine_bail!("hydra::Test", "nope");
    }
    assert!(matches!(failing(), Err(Error::BackendError(_))));
}

#[test]
fn error_is_std_error() {
    fn assert_std_error<E: std::error::Error>(_: &E) {}
    assert_std_error(&Error::MissingResource("x".to_string()));
}
