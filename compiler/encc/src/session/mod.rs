//! Edit sessions.
//!
//! Matching is per document and shares nothing, so it runs on a scoped
//! worker pool. Aggregation needs every document of a partial type, so the
//! session gathers all edit scripts before handing them to the analysis.

use std::sync::Arc;

use enc_analysis::{
    analyze, AnalysisContext, DocumentAnalysis, DocumentDiff, SemanticEdit, SemanticEditKind,
};
use enc_capabilities::Capabilities;
use enc_diagnostic::RudeEditDiagnostic;
use enc_ir::{
    CancellationToken, Cancelled, DeclTree, DocumentId, SharedInterner, Span, StringInterner,
    SymbolKey,
};
use enc_match::{match_trees, EditScript};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::SessionConfig;

/// Why a session produced no result.
#[derive(Copy, Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error("session has {old} old document versions but {new} new ones")]
    DocumentCountMismatch { old: usize, new: usize },
}

/// Both versions of one document.
#[derive(Copy, Clone, Debug)]
pub struct DocumentInput<'d> {
    pub old: &'d DeclTree,
    pub new: &'d DeclTree,
    /// Where the running program is suspended, in old coordinates.
    pub active_statements: &'d [Span],
}

impl<'d> DocumentInput<'d> {
    pub fn new(old: &'d DeclTree, new: &'d DeclTree) -> Self {
        DocumentInput {
            old,
            new,
            active_statements: &[],
        }
    }

    #[must_use]
    pub fn with_active_statements(mut self, spans: &'d [Span]) -> Self {
        self.active_statements = spans;
        self
    }
}

/// One edit session against a running program.
///
/// Trees of every document must have been built with the session's
/// interner. The interner never frees what it holds, so each session gets
/// a fresh one rather than reusing the last session's.
pub struct Session {
    interner: SharedInterner,
    capabilities: Capabilities,
    config: SessionConfig,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(interner: SharedInterner, capabilities: Capabilities) -> Self {
        Session {
            interner,
            capabilities,
            config: SessionConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// A session with an interner of its own.
    pub fn fresh(capabilities: Capabilities) -> Self {
        Session::new(Arc::new(StringInterner::new()), capabilities)
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Token that cancels this session from another thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Analyze the documents of the session, in order.
    ///
    /// Result `i` belongs to `documents[i]`.
    #[tracing::instrument(level = "debug", skip_all, fields(documents = documents.len()))]
    pub fn analyze(&self, documents: &[DocumentInput<'_>]) -> Result<SessionOutput, SessionError> {
        let scripts = self
            .match_documents(documents)
            .inspect_err(|_| tracing::debug!("session cancelled while matching"))?;

        let diffs: Vec<DocumentDiff<'_>> = documents
            .iter()
            .zip(scripts)
            .map(|(doc, script)| DocumentDiff {
                old: doc.old,
                new: doc.new,
                script,
                active_statements: doc.active_statements,
            })
            .collect();

        let cx = AnalysisContext {
            interner: &self.interner,
            capabilities: self.capabilities,
            diagnostic_limit: self.config.max_diagnostics_per_document,
            cancel: &self.cancel,
        };
        let documents = analyze(&diffs, &cx)
            .inspect_err(|_| tracing::debug!("session cancelled while classifying"))?;
        Ok(SessionOutput { documents })
    }

    /// Analyze parallel lists of old and new document versions.
    pub fn analyze_versions(
        &self,
        old: &[DeclTree],
        new: &[DeclTree],
    ) -> Result<SessionOutput, SessionError> {
        if old.len() != new.len() {
            return Err(SessionError::DocumentCountMismatch {
                old: old.len(),
                new: new.len(),
            });
        }
        let documents: Vec<DocumentInput<'_>> = old
            .iter()
            .zip(new)
            .map(|(old, new)| DocumentInput::new(old, new))
            .collect();
        self.analyze(&documents)
    }

    /// Match every document. Any cancelled document cancels all of them.
    fn match_documents(&self, documents: &[DocumentInput<'_>]) -> Result<Vec<EditScript>, Cancelled> {
        let cancel = &self.cancel;
        let match_one = |doc: &DocumentInput<'_>| match_trees(doc.old, doc.new, cancel);

        if !self.config.parallel || documents.len() < 2 {
            return documents.iter().map(match_one).collect();
        }

        rayon::ThreadPoolBuilder::new()
            .stack_size(self.config.worker_stack_size)
            .build_scoped(rayon::ThreadBuilder::run, |pool| {
                pool.install(|| {
                    documents
                        .par_iter()
                        .map(match_one)
                        .collect::<Result<Vec<_>, _>>()
                })
            })
            .unwrap_or_else(|e| {
                tracing::warn!("failed to create thread pool ({e}), matching sequentially");
                documents.iter().map(match_one).collect()
            })
    }
}

/// Per-document results of a session, in input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOutput {
    pub documents: Vec<DocumentAnalysis>,
}

impl SessionOutput {
    /// Whether any document needs a restart. Such a session must not be
    /// applied at all.
    pub fn has_rude_edits(&self) -> bool {
        self.documents.iter().any(DocumentAnalysis::has_rude_edits)
    }

    pub fn document(&self, document: DocumentId) -> Option<&DocumentAnalysis> {
        self.documents.get(document.index())
    }

    /// Every rude edit of the session with its document.
    pub fn rude_edits(&self) -> impl Iterator<Item = (DocumentId, &RudeEditDiagnostic)> + '_ {
        self.documents
            .iter()
            .flat_map(|doc| doc.rude_edits.iter().map(move |d| (doc.document, d)))
    }

    /// Semantic edits of all documents. An edit reported by several
    /// documents of a partial type is listed once, for the first of them.
    pub fn semantic_edits(&self) -> Vec<&SemanticEdit> {
        let mut seen: FxHashSet<(SemanticEditKind, &SymbolKey)> = FxHashSet::default();
        self.documents
            .iter()
            .flat_map(|doc| &doc.semantic_edits)
            .filter(|edit| seen.insert((edit.kind, &edit.symbol)))
            .collect()
    }
}
