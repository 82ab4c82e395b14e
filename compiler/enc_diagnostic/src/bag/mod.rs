//! Per-document diagnostic collection.
//!
//! Analysis never stops at the first rude edit; every diagnostic of a
//! document is pushed here and reported together, ordered by position.
//! Rules that fire for the same node through two paths (a direct edit and a
//! derived one) produce identical diagnostics, which are reported once.

use crate::RudeEditDiagnostic;

/// Collected rude edits of one document.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<RudeEditDiagnostic>,
    /// Maximum number of diagnostics reported (0 = unlimited).
    limit: usize,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bag that reports at most `limit` diagnostics (0 = unlimited).
    pub fn with_limit(limit: usize) -> Self {
        DiagnosticBag {
            diagnostics: Vec::new(),
            limit,
        }
    }

    pub fn push(&mut self, diagnostic: RudeEditDiagnostic) {
        tracing::debug!(
            code = diagnostic.kind.code(),
            span = %diagnostic.span,
            "rude edit"
        );
        self.diagnostics.push(diagnostic);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RudeEditDiagnostic> {
        self.diagnostics.iter()
    }

    /// Keep only diagnostics matching `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&RudeEditDiagnostic) -> bool) {
        self.diagnostics.retain(keep);
    }

    /// Diagnostics ordered by span, then code, without duplicates, cut at
    /// the configured limit.
    pub fn into_sorted(self) -> Vec<RudeEditDiagnostic> {
        let mut diagnostics = self.diagnostics;
        diagnostics.sort_by(|a, b| {
            (a.span, a.kind, &a.arguments).cmp(&(b.span, b.kind, &b.arguments))
        });
        diagnostics
            .dedup_by(|a, b| a.span == b.span && a.kind == b.kind && a.arguments == b.arguments);
        if self.limit > 0 {
            diagnostics.truncate(self.limit);
        }
        diagnostics
    }
}

impl Extend<RudeEditDiagnostic> for DiagnosticBag {
    fn extend<I: IntoIterator<Item = RudeEditDiagnostic>>(&mut self, iter: I) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}
