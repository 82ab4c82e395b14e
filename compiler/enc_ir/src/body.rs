//! Executable body handles.
//!
//! A body is opaque to the analysis except for a content fingerprint and the
//! positions that can hold live execution state: statements execution may be
//! suspended at, lambdas that own closures, and locals that live beyond a
//! single stack frame.

use smallvec::SmallVec;

use crate::{Name, Span};

/// Shape of the code generated for a body.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum BodyKind {
    #[default]
    Regular,
    Async,
    Iterator,
    AsyncIterator,
}

impl BodyKind {
    /// The body compiles to a state machine type.
    pub const fn is_state_machine(self) -> bool {
        !matches!(self, BodyKind::Regular)
    }
}

/// Kind of a body position that can hold state across a patch.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum AnchorKind {
    /// A statement execution can be suspended at.
    Statement,
    /// An `Await` suspension point.
    Await,
    /// A `Yield` suspension point.
    Yield,
    /// A lambda; its closure may already be allocated.
    Lambda,
    /// A local variable; relocatable unless captured.
    Local,
    /// A per-iteration loop variable.
    LoopVariable,
    /// A `Static` local bound to a runtime slot that cannot be renewed.
    StaticLocal,
}

impl AnchorKind {
    /// Positions execution can be resumed at.
    pub const fn is_resumable(self) -> bool {
        matches!(
            self,
            AnchorKind::Statement | AnchorKind::Await | AnchorKind::Yield
        )
    }

    /// Suspension points of a state machine.
    pub const fn is_suspension(self) -> bool {
        matches!(self, AnchorKind::Await | AnchorKind::Yield)
    }
}

/// One stateful position inside a body.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct StateAnchor {
    pub kind: AnchorKind,
    /// Stable label supplied by the parser (normalized statement text,
    /// local name, lambda signature).
    pub label: Name,
    pub span: Span,
    /// Variables captured by a lambda anchor.
    pub captures: SmallVec<[Name; 2]>,
}

/// Executable body of a method-like declaration.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Body {
    pub span: Span,
    pub fingerprint: u64,
    pub kind: BodyKind,
    pub anchors: Vec<StateAnchor>,
}

impl Body {
    /// Anchors of one kind, in source order.
    pub fn anchors_of(&self, kind: AnchorKind) -> impl Iterator<Item = &StateAnchor> {
        self.anchors.iter().filter(move |a| a.kind == kind)
    }

    /// Whether the body holds a local bound to an unrenewable runtime slot.
    pub fn has_static_locals(&self) -> bool {
        self.anchors_of(AnchorKind::StaticLocal).next().is_some()
    }

    /// Variables captured by any lambda of this body, sorted.
    pub fn captured_variables(&self) -> SmallVec<[Name; 4]> {
        let mut captured: SmallVec<[Name; 4]> = self
            .anchors_of(AnchorKind::Lambda)
            .flat_map(|lambda| lambda.captures.iter().copied())
            .collect();
        captured.sort_unstable();
        captured.dedup();
        captured
    }

    /// The resumable anchor covering exactly `span`.
    pub fn resumable_anchor_at(&self, span: Span) -> Option<&StateAnchor> {
        self.anchors
            .iter()
            .find(|a| a.kind.is_resumable() && a.span == span)
    }
}
