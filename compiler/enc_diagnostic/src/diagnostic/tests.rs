use pretty_assertions::assert_eq;

use super::*;

#[test]
fn message_substitutes_label_and_name() {
    let diag =
        RudeEditDiagnostic::declaration(RudeEditKind::Renamed, Span::new(4, 9), "enum", "Color");
    assert_eq!(
        diag.message(),
        "Renaming enum 'Color' requires restarting the application."
    );
    assert!(!diag.is_unsupported_by_runtime());
}

#[test]
fn runtime_reason_lists_missing_capabilities() {
    let diag =
        RudeEditDiagnostic::declaration(RudeEditKind::Renamed, Span::new(20, 21), "parameter", "b")
            .unsupported_by_runtime(Capabilities::RENAME_PARAMETER);
    assert_eq!(
        diag.message(),
        "Renaming parameter 'b' requires restarting the application because it is not \
         supported by this runtime (missing RenameParameter)."
    );
    assert_eq!(diag.kind, RudeEditKind::Renamed);
    assert!(diag.is_unsupported_by_runtime());
}

#[test]
fn display_prefixes_code_and_span() {
    let diag = RudeEditDiagnostic::declaration(RudeEditKind::Moved, Span::new(1, 2), "method", "G");
    assert_eq!(
        diag.to_string(),
        "ENC0002 at 1..2: Moving method 'G' requires restarting the application."
    );
}

#[test]
fn missing_arguments_leave_placeholders() {
    let diag = RudeEditDiagnostic::new(RudeEditKind::Deleted, Span::DUMMY).with_arg("field");
    assert_eq!(
        diag.message(),
        "Deleting field '{1}' requires restarting the application."
    );
}
