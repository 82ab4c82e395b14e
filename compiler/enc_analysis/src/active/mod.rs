//! Active statement tracking.
//!
//! The running program is suspended at active statements. Each must have a
//! place to resume in the new version of its method:
//!
//! - a method whose body did not change keeps the statement at the same
//!   offset within the body;
//! - an updated body maps the statement through its [`SyntaxMap`];
//! - a method relocated to another document is followed there.
//!
//! A statement with no counterpart is a rude edit: the program cannot
//! resume where it is.

use enc_diagnostic::{RudeEditDiagnostic, RudeEditKind};
use enc_ir::{DocumentId, Span, StringInterner};

use crate::aggregate::document_id;
use crate::{Aggregate, NodeRef, SyntaxMap};

/// Where an active statement resumes after the edit.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ActiveStatementUpdate {
    pub old_document: DocumentId,
    pub old_span: Span,
    pub new_document: DocumentId,
    pub new_span: Span,
}

/// Mapped active statements and the ones that could not be mapped.
#[derive(Debug, Default)]
pub struct ActiveStatements {
    pub updates: Vec<ActiveStatementUpdate>,
    pub diagnostics: Vec<(DocumentId, RudeEditDiagnostic)>,
}

/// Map every active statement of the session to its new location.
#[tracing::instrument(level = "debug", skip_all)]
pub fn track(aggregate: &Aggregate<'_>, interner: &StringInterner) -> ActiveStatements {
    let mut result = ActiveStatements::default();
    for (index, doc) in aggregate.documents().iter().enumerate() {
        let document = document_id(index);
        for &span in doc.active_statements {
            map_statement(aggregate, interner, document, span, &mut result);
        }
    }
    result
}

fn map_statement(
    aggregate: &Aggregate<'_>,
    interner: &StringInterner,
    document: DocumentId,
    span: Span,
    result: &mut ActiveStatements,
) {
    let old_tree = aggregate.old_tree(document);
    let Some(owner) = old_tree.body_owner_at(span) else {
        tracing::debug!(%document, %span, "active statement outside any body");
        return;
    };
    let Some(old_body) = old_tree.node(owner).body.as_ref() else {
        return;
    };
    let old = NodeRef::new(document, owner);

    let Some(new) = aggregate.new_of(old) else {
        let (at, anchor) = aggregate.surviving_span(old);
        result.diagnostics.push((
            at,
            RudeEditDiagnostic::declaration(
                RudeEditKind::DeleteActiveStatement,
                anchor,
                old_tree.node(owner).label(old_tree),
                old_tree.display_name(owner, interner),
            ),
        ));
        return;
    };

    let new_tree = aggregate.new_tree(new.document);
    let new_node = new_tree.node(new.id);
    let rude = |kind| {
        (
            new.document,
            RudeEditDiagnostic::declaration(
                kind,
                new_node.span,
                new_node.label(new_tree),
                new_tree.display_name(new.id, interner),
            ),
        )
    };

    let Some(new_body) = new_node.body.as_ref() else {
        result
            .diagnostics
            .push(rude(RudeEditKind::DeleteActiveStatement));
        return;
    };

    let new_span = if old_body.fingerprint == new_body.fingerprint && old_body.kind == new_body.kind
    {
        Some(span.rebase(old_body.span, new_body.span))
    } else {
        // A static local is reported by the body update itself.
        let Some(map) = SyntaxMap::build(old_body, new_body) else {
            return;
        };
        map.map(span)
    };

    match new_span {
        Some(new_span) => result.updates.push(ActiveStatementUpdate {
            old_document: document,
            old_span: span,
            new_document: new.document,
            new_span,
        }),
        None => {
            let suspended = old_body
                .resumable_anchor_at(span)
                .is_some_and(|anchor| anchor.kind.is_suspension());
            let kind = if suspended {
                RudeEditKind::AwaitShapeChange
            } else {
                RudeEditKind::DeleteActiveStatement
            };
            tracing::debug!(%document, %span, code = kind.code(), "active statement lost");
            result.diagnostics.push(rude(kind));
        }
    }
}
