//! Edit-and-continue analysis.
//!
//! Consumes the per-document edit scripts of one edit session and decides,
//! edit by edit, whether the change can be applied to the running program:
//!
//! 1. **Aggregation**: documents are merged into one view; partial types
//!    are grouped and declarations moved between documents are re-paired
//!    ([`Aggregate`]).
//! 2. **Classification**: each edit is allowed or rude under the runtime's
//!    capabilities ([`RuleEngine`]). Reloadable types fold their edits into
//!    one whole-type replacement.
//! 3. **Synthesis**: allowed edits become symbol-level [`SemanticEdit`]s,
//!    including constructor updates implied by initializer changes
//!    ([`Synthesizer`]).
//! 4. **Active state**: suspended statements are mapped into the new
//!    bodies through [`SyntaxMap`]s.
//!
//! [`analyze`] runs all four stages and reports per document either the
//! rude edits or the semantic edits.

mod active;
mod aggregate;
mod analysis;
mod document;
mod rules;
mod semantic;
mod synthesize;
mod syntax_map;

#[cfg(test)]
mod test_helpers;

pub use active::{track as track_active_statements, ActiveStatementUpdate, ActiveStatements};
pub use aggregate::{Aggregate, AggregatedEdit, LogicalType};
pub use analysis::{analyze, AnalysisContext, DocumentAnalysis};
pub use document::{DocumentDiff, NodeRef};
pub use rules::{RuleEngine, Verdict};
pub use semantic::{SemanticEdit, SemanticEditKind};
pub use synthesize::{Synthesis, Synthesizer};
pub use syntax_map::SyntaxMap;
