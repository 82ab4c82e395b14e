//! Session-wide analysis of matched documents.

use std::collections::BTreeMap;

use enc_capabilities::Capabilities;
use enc_diagnostic::{DiagnosticBag, RudeEditDiagnostic};
use enc_ir::{CancellationToken, Cancelled, DocumentId, StringInterner, SymbolKey};

use crate::active::{self, ActiveStatementUpdate};
use crate::aggregate::document_id;
use crate::rules::{RuleEngine, Verdict};
use crate::synthesize::Synthesizer;
use crate::{Aggregate, DocumentDiff, SemanticEdit};

/// Everything classification reads besides the documents themselves.
#[derive(Copy, Clone)]
pub struct AnalysisContext<'a> {
    pub interner: &'a StringInterner,
    pub capabilities: Capabilities,
    /// Per-document cap on reported diagnostics (0 = unlimited).
    pub diagnostic_limit: usize,
    pub cancel: &'a CancellationToken,
}

/// Result for one document: rude edits, or the semantic edits to apply
/// when there are none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentAnalysis {
    pub document: DocumentId,
    /// Ordered by span.
    pub rude_edits: Vec<RudeEditDiagnostic>,
    /// Empty whenever `rude_edits` is not.
    pub semantic_edits: Vec<SemanticEdit>,
    /// Active statements of this document and where they resume.
    pub active_statements: Vec<ActiveStatementUpdate>,
}

impl DocumentAnalysis {
    #[inline]
    pub fn has_rude_edits(&self) -> bool {
        !self.rude_edits.is_empty()
    }
}

/// Classify every edit of the session and synthesize semantic edits.
///
/// Returns one result per document, in input order. A cancelled analysis
/// returns no partial result.
#[tracing::instrument(level = "debug", skip_all, fields(documents = documents.len()))]
pub fn analyze(
    documents: &[DocumentDiff<'_>],
    cx: &AnalysisContext<'_>,
) -> Result<Vec<DocumentAnalysis>, Cancelled> {
    let aggregate = Aggregate::build(documents, cx.cancel)?;
    let rules = RuleEngine::new(&aggregate, cx.interner, cx.capabilities);
    let mut synthesizer = Synthesizer::new(&aggregate, cx.interner);
    let mut bags: Vec<DiagnosticBag> = documents
        .iter()
        .map(|_| DiagnosticBag::with_limit(cx.diagnostic_limit))
        .collect();

    let can_replace = cx
        .capabilities
        .has(Capabilities::NEW_TYPE_DEFINITION | Capabilities::BASELINE);
    let mut replaced: BTreeMap<SymbolKey, DocumentId> = BTreeMap::new();

    for edit in aggregate.edits() {
        cx.cancel.check()?;
        let verdict = rules.classify(edit);

        if can_replace {
            if let Some(ty) = aggregate.reloadable_type(edit) {
                replaced
                    .entry(ty)
                    .and_modify(|owner| *owner = (*owner).min(edit.owner))
                    .or_insert(edit.owner);
                if let Verdict::Rude(diagnostics) = verdict {
                    bags[edit.owner.index()]
                        .extend(diagnostics.into_iter().filter(|d| d.kind.is_active_state()));
                }
                continue;
            }
        }

        match verdict {
            Verdict::Subsumed => {}
            Verdict::Allowed => synthesizer.add(edit),
            Verdict::Rude(diagnostics) => bags[edit.owner.index()].extend(diagnostics),
        }
    }

    for (ty, owner) in replaced {
        synthesizer.replace(ty, owner);
    }
    let synthesis = synthesizer.finish();
    for (document, diagnostic) in synthesis.diagnostics {
        bags[document.index()].push(diagnostic);
    }

    cx.cancel.check()?;
    let tracked = active::track(&aggregate, cx.interner);
    for (document, diagnostic) in tracked.diagnostics {
        bags[document.index()].push(diagnostic);
    }

    let mut edits_by_document: Vec<Vec<SemanticEdit>> = vec![Vec::new(); documents.len()];
    for (document, edit) in synthesis.edits {
        edits_by_document[document.index()].push(edit);
    }

    let results = bags
        .into_iter()
        .zip(edits_by_document)
        .enumerate()
        .map(|(index, (bag, semantic_edits))| {
            let document = document_id(index);
            let rude_edits = bag.into_sorted();
            let semantic_edits = if rude_edits.is_empty() {
                semantic_edits
            } else {
                Vec::new()
            };
            DocumentAnalysis {
                document,
                rude_edits,
                semantic_edits,
                active_statements: tracked
                    .updates
                    .iter()
                    .filter(|u| u.old_document == document)
                    .copied()
                    .collect(),
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        rude = results.iter().filter(|r| r.has_rude_edits()).count(),
        "analysis complete"
    );
    Ok(results)
}

#[cfg(test)]
mod tests;
