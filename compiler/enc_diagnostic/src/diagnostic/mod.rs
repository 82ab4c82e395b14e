//! Rude edit diagnostic values.

use std::fmt;

use enc_capabilities::Capabilities;
use enc_ir::Span;
use smallvec::SmallVec;

use crate::RudeEditKind;

/// Why an edit is rude.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum RudeReason {
    /// No runtime can apply this edit.
    #[default]
    NeverSupported,
    /// A runtime with the `missing` capabilities could apply it.
    NotSupportedByRuntime { missing: Capabilities },
}

/// One rude edit, anchored on the offending declaration.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct RudeEditDiagnostic {
    pub kind: RudeEditKind,
    pub reason: RudeReason,
    /// Span of the offending node in the new document, or of the nearest
    /// surviving ancestor when the node was deleted.
    pub span: Span,
    /// Positional message arguments.
    pub arguments: SmallVec<[String; 2]>,
}

impl RudeEditDiagnostic {
    pub fn new(kind: RudeEditKind, span: Span) -> Self {
        RudeEditDiagnostic {
            kind,
            reason: RudeReason::NeverSupported,
            span,
            arguments: SmallVec::new(),
        }
    }

    /// Diagnostic about a declaration, with its kind label and display name
    /// as arguments.
    pub fn declaration(
        kind: RudeEditKind,
        span: Span,
        label: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(kind, span).with_arg(label).with_arg(name)
    }

    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    /// Mark the edit as applicable on a runtime that has `missing`.
    #[must_use]
    pub fn unsupported_by_runtime(mut self, missing: Capabilities) -> Self {
        self.reason = RudeReason::NotSupportedByRuntime { missing };
        self
    }

    pub fn is_unsupported_by_runtime(&self) -> bool {
        matches!(self.reason, RudeReason::NotSupportedByRuntime { .. })
    }

    /// Rendered message text.
    pub fn message(&self) -> String {
        let mut text = self.kind.template().to_owned();
        for (i, arg) in self.arguments.iter().enumerate() {
            text = text.replace(&format!("{{{i}}}"), arg);
        }
        match self.reason {
            RudeReason::NeverSupported => {
                text.push_str(" requires restarting the application.");
            }
            RudeReason::NotSupportedByRuntime { missing } => {
                text.push_str(
                    " requires restarting the application because it is not supported by this runtime",
                );
                if !missing.is_empty() {
                    text.push_str(" (missing ");
                    text.push_str(&missing.to_string());
                    text.push(')');
                }
                text.push('.');
            }
        }
        text
    }
}

impl fmt::Display for RudeEditDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind.code(), self.span, self.message())
    }
}

#[cfg(test)]
mod tests;
