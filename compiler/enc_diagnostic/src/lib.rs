//! Rude edit diagnostics.
//!
//! A rude edit is an expected outcome of analysis, not an engine failure: the
//! edit is valid source but cannot be applied to the running process. Every
//! category has a stable `ENC####` code and a message template; the reason
//! records whether a newer runtime could apply the edit.
//!
//! # Components
//!
//! - [`RudeEditKind`]: closed set of categories with codes and templates
//! - [`RudeEditDiagnostic`]: one classified edit, anchored on a span
//! - [`DiagnosticBag`]: per-document collection, sorted and deduplicated

mod bag;
mod diagnostic;
mod kind;

pub use bag::DiagnosticBag;
pub use diagnostic::{RudeEditDiagnostic, RudeReason};
pub use kind::RudeEditKind;
