use enc_ir::{AnchorKind, BodyKind, StateAnchor, StringInterner};
use pretty_assertions::assert_eq;
use smallvec::SmallVec;

use super::*;

fn body(interner: &StringInterner, anchors: &[(AnchorKind, &str, u32)]) -> Body {
    Body {
        span: Span::new(0, 1000),
        fingerprint: 0,
        kind: BodyKind::Regular,
        anchors: anchors
            .iter()
            .map(|&(kind, label, start)| StateAnchor {
                kind,
                label: interner.intern(label),
                span: Span::new(start, start + 5),
                captures: SmallVec::new(),
            })
            .collect(),
    }
}

fn at(start: u32) -> Span {
    Span::new(start, start + 5)
}

// ── Statements ──────────────────────────────────────────────────────

#[test]
fn unchanged_statements_map_in_order() {
    let interner = StringInterner::new();
    let old = body(
        &interner,
        &[(AnchorKind::Statement, "a", 10), (AnchorKind::Statement, "b", 20)],
    );
    let new = body(
        &interner,
        &[(AnchorKind::Statement, "a", 40), (AnchorKind::Statement, "b", 50)],
    );
    let map = SyntaxMap::build(&old, &new).unwrap_or_else(|| panic!("no static locals"));
    assert_eq!(map.len(), 2);
    assert_eq!(map.map(at(10)), Some(at(40)));
    assert_eq!(map.map(at(20)), Some(at(50)));
}

#[test]
fn inserted_statement_does_not_shift_neighbors() {
    let interner = StringInterner::new();
    let old = body(
        &interner,
        &[(AnchorKind::Statement, "a", 10), (AnchorKind::Statement, "b", 20)],
    );
    let new = body(
        &interner,
        &[
            (AnchorKind::Statement, "a", 10),
            (AnchorKind::Statement, "x", 20),
            (AnchorKind::Statement, "b", 30),
        ],
    );
    let map = SyntaxMap::build(&old, &new).unwrap_or_else(|| panic!("no static locals"));
    assert_eq!(map.map(at(20)), Some(at(30)));
}

#[test]
fn deleted_statement_is_unmapped() {
    let interner = StringInterner::new();
    let old = body(
        &interner,
        &[(AnchorKind::Statement, "a", 10), (AnchorKind::Statement, "b", 20)],
    );
    let new = body(&interner, &[(AnchorKind::Statement, "b", 10)]);
    let map = SyntaxMap::build(&old, &new).unwrap_or_else(|| panic!("no static locals"));
    assert_eq!(map.map(at(10)), None);
    assert_eq!(map.map(at(20)), Some(at(10)));
}

#[test]
fn repeated_labels_pair_in_source_order() {
    let interner = StringInterner::new();
    let old = body(
        &interner,
        &[
            (AnchorKind::Statement, "i += 1", 10),
            (AnchorKind::Statement, "i += 1", 20),
        ],
    );
    let new = body(
        &interner,
        &[
            (AnchorKind::Statement, "i += 1", 10),
            (AnchorKind::Statement, "log", 20),
            (AnchorKind::Statement, "i += 1", 30),
        ],
    );
    let map = SyntaxMap::build(&old, &new).unwrap_or_else(|| panic!("no static locals"));
    let pairs: Vec<(Span, Span)> = map.iter().collect();
    assert_eq!(pairs, vec![(at(10), at(10)), (at(20), at(30))]);
}

// ── Anchor kinds ────────────────────────────────────────────────────

#[test]
fn anchors_pair_only_within_their_kind() {
    let interner = StringInterner::new();
    let old = body(&interner, &[(AnchorKind::Local, "x", 10)]);
    let new = body(&interner, &[(AnchorKind::Statement, "x", 10)]);
    let map = SyntaxMap::build(&old, &new).unwrap_or_else(|| panic!("no static locals"));
    assert!(map.is_empty());
}

#[test]
fn suspension_points_and_lambdas_are_mapped() {
    let interner = StringInterner::new();
    let old = body(
        &interner,
        &[
            (AnchorKind::Await, "await a", 10),
            (AnchorKind::Lambda, "Function(x)", 20),
            (AnchorKind::LoopVariable, "i", 30),
        ],
    );
    let new = body(
        &interner,
        &[
            (AnchorKind::Await, "await a", 110),
            (AnchorKind::Lambda, "Function(x)", 120),
            (AnchorKind::LoopVariable, "i", 130),
        ],
    );
    let map = SyntaxMap::build(&old, &new).unwrap_or_else(|| panic!("no static locals"));
    assert_eq!(map.len(), 3);
    assert_eq!(map.map(at(10)), Some(at(110)));
    assert_eq!(map.map(at(20)), Some(at(120)));
    assert_eq!(map.map(at(30)), Some(at(130)));
}

#[test]
fn static_local_prevents_mapping() {
    let interner = StringInterner::new();
    let old = body(
        &interner,
        &[
            (AnchorKind::StaticLocal, "count", 10),
            (AnchorKind::Statement, "a", 20),
        ],
    );
    let new = body(&interner, &[(AnchorKind::Statement, "a", 20)]);
    assert_eq!(SyntaxMap::build(&old, &new), None);
}

#[test]
fn static_local_added_by_the_edit_does_not_prevent_mapping() {
    let interner = StringInterner::new();
    let old = body(&interner, &[(AnchorKind::Statement, "a", 20)]);
    let new = body(
        &interner,
        &[
            (AnchorKind::StaticLocal, "count", 10),
            (AnchorKind::Statement, "a", 20),
        ],
    );
    let map = SyntaxMap::build(&old, &new).unwrap_or_else(|| panic!("no static locals"));
    assert_eq!(map.map(at(20)), Some(at(20)));
}
