use enc_diagnostic::RudeEditKind;
use enc_ir::{AnchorKind, Decl, DeclId, Modifiers, Span, TreeBuilder};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::{build, diff, diff_active, rude_kinds, run, semantic};

fn class(interner: &StringInterner, f: impl FnOnce(&mut TreeBuilder<'_>, DeclId)) -> enc_ir::DeclTree {
    build(interner, |b| {
        let c = b.add(b.root(), Decl::class("C"));
        f(b, c);
    })
}

// ── Per-document results ────────────────────────────────────────────

#[test]
fn rude_document_reports_no_semantic_edits() {
    let interner = StringInterner::new();
    let old = class(&interner, |b, c| {
        b.add(c, Decl::method("F").body(1));
        b.add(c, Decl::method("G").body(1));
    });
    let new = class(&interner, |b, c| {
        b.add(c, Decl::method("F").body(2));
        b.add(c, Decl::method("G").modifiers(Modifiers::VIRTUAL).body(1));
    });
    let documents = [diff(&old, &new)];
    let results = run(&interner, Capabilities::all(), &documents);

    assert_eq!(results.len(), 1);
    assert!(results[0].has_rude_edits());
    assert_eq!(rude_kinds(&results[0]), vec![RudeEditKind::InsertVirtual]);
    assert!(results[0].semantic_edits.is_empty());
}

#[test]
fn documents_are_judged_separately() {
    let interner = StringInterner::new();
    let a_old = build(&interner, |b| {
        let c = b.add(b.root(), Decl::class("C"));
        b.add(c, Decl::method("F").body(1));
    });
    let a_new = build(&interner, |b| {
        let c = b.add(b.root(), Decl::class("C"));
        b.add(c, Decl::method("F").body(2));
    });
    let b_old = build(&interner, |b| {
        b.add(b.root(), Decl::class("D"));
    });
    let b_new = build(&interner, |b| {
        b.add(b.root(), Decl::class("Renamed"));
    });
    let documents = [diff(&a_old, &a_new), diff(&b_old, &b_new)];
    let results = run(&interner, Capabilities::all(), &documents);

    assert_eq!(results[0].document, DocumentId(0));
    assert_eq!(semantic(&results[0], &interner), vec!["update C.F()"]);
    assert_eq!(results[1].document, DocumentId(1));
    assert_eq!(rude_kinds(&results[1]), vec![RudeEditKind::Renamed]);
}

#[test]
fn every_rude_edit_of_a_document_is_reported_in_span_order() {
    let interner = StringInterner::new();
    let old = build(&interner, |b| {
        let c = b.add(b.root(), Decl::class("C"));
        b.add(c, Decl::method("F").span(10, 20).body(1));
        b.add(c, Decl::method("G").span(30, 40).body(2));
    });
    let new = build(&interner, |b| {
        let c = b.add(b.root(), Decl::class("C"));
        b.add(c, Decl::method("G2").span(30, 40).body(2));
        b.add(c, Decl::method("F2").span(10, 20).body(1));
    });
    let documents = [diff(&old, &new)];
    let results = run(&interner, Capabilities::all(), &documents);

    let spans: Vec<Span> = results[0].rude_edits.iter().map(|d| d.span).collect();
    assert_eq!(spans, vec![Span::new(10, 20), Span::new(30, 40)]);
    assert!(results[0]
        .rude_edits
        .iter()
        .all(|d| d.kind == RudeEditKind::Renamed));
}

#[test]
fn diagnostic_limit_caps_each_document() {
    let interner = StringInterner::new();
    let old = class(&interner, |b, c| {
        b.add(c, Decl::field("a", "Integer"));
        b.add(c, Decl::field("b", "Integer"));
    });
    let new = class(&interner, |_, _| {});
    let documents = [diff(&old, &new)];
    let cancel = CancellationToken::new();
    let cx = AnalysisContext {
        interner: &interner,
        capabilities: Capabilities::all(),
        diagnostic_limit: 1,
        cancel: &cancel,
    };
    let results = analyze(&documents, &cx).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(rude_kinds(&results[0]), vec![RudeEditKind::Deleted]);
}

#[test]
fn cancelled_analysis_has_no_result() {
    let interner = StringInterner::new();
    let old = class(&interner, |b, c| {
        b.add(c, Decl::method("F").body(1));
    });
    let new = class(&interner, |b, c| {
        b.add(c, Decl::method("F").body(2));
    });
    let documents = [diff(&old, &new)];
    let cancel = CancellationToken::new();
    cancel.cancel();
    let cx = AnalysisContext {
        interner: &interner,
        capabilities: Capabilities::all(),
        diagnostic_limit: 0,
        cancel: &cancel,
    };
    assert_eq!(analyze(&documents, &cx), Err(Cancelled));
}

// ── Reloadable types ────────────────────────────────────────────────

fn reloadable(interner: &StringInterner, virtual_g: bool) -> enc_ir::DeclTree {
    build(interner, |b| {
        let c = b.add(b.root(), Decl::class("C").reloadable());
        b.add(c, Decl::method("F").body(1));
        if virtual_g {
            b.add(c, Decl::method("G").modifiers(Modifiers::VIRTUAL).body(2));
        }
    })
}

#[test]
fn reloadable_type_is_replaced_whole() {
    let interner = StringInterner::new();
    let old = reloadable(&interner, false);
    let new = reloadable(&interner, true);
    let documents = [diff(&old, &new)];
    let results = run(&interner, Capabilities::all(), &documents);

    assert!(!results[0].has_rude_edits());
    assert_eq!(semantic(&results[0], &interner), vec!["replace C"]);
}

#[test]
fn reloadable_type_without_capability_keeps_rude_edits() {
    let interner = StringInterner::new();
    let old = reloadable(&interner, false);
    let new = reloadable(&interner, true);
    let documents = [diff(&old, &new)];
    let results = run(
        &interner,
        Capabilities::all() - Capabilities::NEW_TYPE_DEFINITION,
        &documents,
    );
    assert_eq!(rude_kinds(&results[0]), vec![RudeEditKind::InsertVirtual]);
}

#[test]
fn replacement_keeps_active_statement_diagnostics() {
    let interner = StringInterner::new();
    let shape = |fingerprint: u64, with_statement: bool| {
        move |b: &mut TreeBuilder<'_>| {
            let c = b.add(b.root(), Decl::class("C").reloadable());
            let f = Decl::method("F")
                .span(100, 200)
                .body(fingerprint)
                .body_span(100, 200);
            let f = if with_statement {
                f.anchor(AnchorKind::Statement, "a", Span::new(110, 115))
            } else {
                f
            };
            b.add(c, f);
        }
    };
    let old = build(&interner, shape(1, true));
    let new = build(&interner, shape(2, false));
    let active = [Span::new(110, 115)];
    let documents = [diff_active(&old, &new, &active)];
    let results = run(&interner, Capabilities::all(), &documents);
    assert_eq!(
        rude_kinds(&results[0]),
        vec![RudeEditKind::DeleteActiveStatement]
    );
}

// ── Active statements ───────────────────────────────────────────────

#[test]
fn active_statements_are_reported_with_their_document() {
    let interner = StringInterner::new();
    let shape = |fingerprint: u64| {
        move |b: &mut TreeBuilder<'_>| {
            let c = b.add(b.root(), Decl::class("C"));
            b.add(
                c,
                Decl::method("F")
                    .span(100, 200)
                    .body(fingerprint)
                    .body_span(100, 200)
                    .anchor(AnchorKind::Statement, "a", Span::new(110, 115)),
            );
        }
    };
    let old = build(&interner, shape(1));
    let new = build(&interner, shape(2));
    let active = [Span::new(110, 115)];
    let documents = [diff_active(&old, &new, &active)];
    let results = run(&interner, Capabilities::all(), &documents);

    assert_eq!(semantic(&results[0], &interner), vec!["update C.F()"]);
    assert_eq!(results[0].active_statements.len(), 1);
    assert_eq!(
        results[0].active_statements[0].new_span,
        Span::new(110, 115)
    );
}
