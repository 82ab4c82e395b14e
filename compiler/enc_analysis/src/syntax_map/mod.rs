//! Syntax maps between two versions of a body.
//!
//! A map sends each stateful position of the old body (statements,
//! suspension points, lambdas, locals, loop variables) to its counterpart
//! in the new body. Anchors pair within their kind by label, keeping source
//! order (longest common subsequence), so an inserted statement never
//! shifts its neighbors onto the wrong counterpart.

use enc_ir::{AnchorKind, Body, Span, StateAnchor};

/// Anchor kinds that can be carried over to a new body.
const MAPPED_KINDS: [AnchorKind; 6] = [
    AnchorKind::Statement,
    AnchorKind::Await,
    AnchorKind::Yield,
    AnchorKind::Lambda,
    AnchorKind::Local,
    AnchorKind::LoopVariable,
];

/// Old-position to new-position map of one updated body.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct SyntaxMap {
    /// Sorted by old span.
    pairs: Vec<(Span, Span)>,
}

impl SyntaxMap {
    /// Map the anchors of `old` onto those of `new`.
    ///
    /// Returns `None` when the old body holds a static local: its runtime
    /// slot cannot follow the body into a new version.
    pub fn build(old: &Body, new: &Body) -> Option<SyntaxMap> {
        if old.has_static_locals() {
            return None;
        }
        let mut pairs = Vec::new();
        for kind in MAPPED_KINDS {
            let before: Vec<&StateAnchor> = old.anchors_of(kind).collect();
            let after: Vec<&StateAnchor> = new.anchors_of(kind).collect();
            pairs.extend(
                common_subsequence(&before, &after)
                    .into_iter()
                    .map(|(o, n)| (before[o].span, after[n].span)),
            );
        }
        pairs.sort_unstable();
        Some(SyntaxMap { pairs })
    }

    /// New position of an old anchor span.
    pub fn map(&self, old: Span) -> Option<Span> {
        self.pairs
            .binary_search_by(|(o, _)| o.cmp(&old))
            .ok()
            .map(|i| self.pairs[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Span, Span)> + '_ {
        self.pairs.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Index pairs of a longest common subsequence of anchor labels.
fn common_subsequence(old: &[&StateAnchor], new: &[&StateAnchor]) -> Vec<(usize, usize)> {
    let (n, m) = (old.len(), new.len());
    // lengths[i * (m + 1) + j]: LCS length of old[i..] and new[j..]
    let mut lengths = vec![0u32; (n + 1) * (m + 1)];
    let at = |i: usize, j: usize| i * (m + 1) + j;
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[at(i, j)] = if old[i].label == new[j].label {
                lengths[at(i + 1, j + 1)] + 1
            } else {
                lengths[at(i + 1, j)].max(lengths[at(i, j + 1)])
            };
        }
    }

    let mut pairs = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i].label == new[j].label {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if lengths[at(i + 1, j)] >= lengths[at(i, j + 1)] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

#[cfg(test)]
mod tests;
