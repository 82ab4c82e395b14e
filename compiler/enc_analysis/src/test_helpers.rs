//! Session fixtures shared by the unit tests.

use enc_capabilities::Capabilities;
use enc_diagnostic::RudeEditKind;
use enc_ir::{CancellationToken, DeclId, DeclTree, Span, StringInterner, TreeBuilder};
use enc_match::match_trees;

use crate::{analyze, AnalysisContext, DocumentAnalysis, DocumentDiff};

pub(crate) fn build(interner: &StringInterner, f: impl FnOnce(&mut TreeBuilder<'_>)) -> DeclTree {
    let mut b = TreeBuilder::new(interner);
    f(&mut b);
    b.finish().unwrap_or_else(|e| panic!("{e}"))
}

/// Match two versions of a document.
pub(crate) fn diff<'d>(old: &'d DeclTree, new: &'d DeclTree) -> DocumentDiff<'d> {
    diff_active(old, new, &[])
}

pub(crate) fn diff_active<'d>(
    old: &'d DeclTree,
    new: &'d DeclTree,
    active_statements: &'d [Span],
) -> DocumentDiff<'d> {
    let script = match_trees(old, new, &CancellationToken::new()).unwrap_or_else(|e| panic!("{e}"));
    DocumentDiff {
        old,
        new,
        script,
        active_statements,
    }
}

pub(crate) fn run(
    interner: &StringInterner,
    capabilities: Capabilities,
    documents: &[DocumentDiff<'_>],
) -> Vec<DocumentAnalysis> {
    let cancel = CancellationToken::new();
    let cx = AnalysisContext {
        interner,
        capabilities,
        diagnostic_limit: 0,
        cancel: &cancel,
    };
    analyze(documents, &cx).unwrap_or_else(|e| panic!("{e}"))
}

/// First declaration named `name`.
pub(crate) fn find(tree: &DeclTree, interner: &StringInterner, name: &str) -> DeclId {
    let name = interner.intern(name);
    tree.ids()
        .find(|&id| tree.node(id).key.name == name)
        .unwrap_or_else(|| panic!("no declaration named {}", interner.lookup(name)))
}

pub(crate) fn rude_kinds(result: &DocumentAnalysis) -> Vec<RudeEditKind> {
    result.rude_edits.iter().map(|d| d.kind).collect()
}

/// Rendered semantic edits, sorted.
pub(crate) fn semantic(result: &DocumentAnalysis, interner: &StringInterner) -> Vec<String> {
    let mut edits: Vec<String> = result
        .semantic_edits
        .iter()
        .map(|e| e.display(interner))
        .collect();
    edits.sort();
    edits
}
