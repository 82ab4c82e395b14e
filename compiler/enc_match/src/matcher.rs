//! Top-down declaration matcher.

use enc_ir::{CancellationToken, Cancelled, DeclId, DeclKey, DeclKind, DeclTree};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::reorder::stable_positions;
use crate::similarity::is_similar;
use crate::stack::ensure_sufficient_stack;
use crate::{ContentChange, Edit, EditKind, EditScript};

type Scope = SmallVec<[DeclId; 16]>;

/// Match the old and new declaration tree of one document.
///
/// Cancellation is checked at every parent visited; a cancelled match
/// yields no script at all.
#[tracing::instrument(level = "debug", skip_all, fields(old = old.len(), new = new.len()))]
pub fn match_trees(
    old: &DeclTree,
    new: &DeclTree,
    cancel: &CancellationToken,
) -> Result<EditScript, Cancelled> {
    match_subtrees((old, old.root()), (new, new.root()), cancel)
}

/// Match the descendants of two declarations already known to correspond,
/// possibly from different documents.
///
/// The roots themselves get no edit; nodes outside the two subtrees are
/// neither matched nor covered.
pub fn match_subtrees(
    (old, old_root): (&DeclTree, DeclId),
    (new, new_root): (&DeclTree, DeclId),
    cancel: &CancellationToken,
) -> Result<EditScript, Cancelled> {
    let mut matcher = Matcher {
        old,
        new,
        cancel,
        old_to_new: vec![None; old.len()],
        new_to_old: vec![None; new.len()],
        edits: Vec::new(),
        pending_old: Vec::new(),
        pending_new: Vec::new(),
    };

    matcher.link(old_root, new_root);
    matcher.match_children(old_root, new_root)?;
    matcher.match_across_parents()?;

    for id in std::mem::take(&mut matcher.pending_old) {
        matcher.delete_subtree(id);
    }
    for id in std::mem::take(&mut matcher.pending_new) {
        matcher.insert_subtree(id);
    }

    tracing::debug!(edits = matcher.edits.len(), "matched declarations");
    Ok(EditScript::new(
        matcher.edits,
        matcher.old_to_new,
        matcher.new_to_old,
    ))
}

struct Matcher<'t> {
    old: &'t DeclTree,
    new: &'t DeclTree,
    cancel: &'t CancellationToken,
    old_to_new: Vec<Option<DeclId>>,
    new_to_old: Vec<Option<DeclId>>,
    edits: Vec<Edit>,
    /// Unmatched subtree roots, paired across parents once the top-down
    /// pass is done.
    pending_old: Vec<DeclId>,
    pending_new: Vec<DeclId>,
}

impl Matcher<'_> {
    fn link(&mut self, old: DeclId, new: DeclId) {
        self.old_to_new[old.index()] = Some(new);
        self.new_to_old[new.index()] = Some(old);
    }

    fn new_of(&self, old: DeclId) -> Option<DeclId> {
        self.old_to_new[old.index()]
    }

    fn is_new_matched(&self, new: DeclId) -> bool {
        self.new_to_old[new.index()].is_some()
    }

    fn match_children(&mut self, old_parent: DeclId, new_parent: DeclId) -> Result<(), Cancelled> {
        ensure_sufficient_stack(|| self.match_children_inner(old_parent, new_parent))
    }

    fn match_children_inner(
        &mut self,
        old_parent: DeclId,
        new_parent: DeclId,
    ) -> Result<(), Cancelled> {
        self.cancel.check()?;

        let old_scope = scope(self.old, old_parent);
        let new_scope = scope(self.new, new_parent);

        let leftover_old = self.pair_by_key(&old_scope, &new_scope);
        let leftover_old = self.pair_by_similarity(leftover_old, &new_scope);
        self.pair_groups(old_parent, new_parent);

        let leftover_new: Scope = new_scope
            .iter()
            .copied()
            .filter(|&n| !self.is_new_matched(n))
            .collect();
        self.pending_old.extend(leftover_old);
        self.pending_new.extend(leftover_new);

        let pairs: SmallVec<[(DeclId, DeclId); 16]> = old_scope
            .iter()
            .filter_map(|&o| self.new_of(o).map(|n| (o, n)))
            .collect();
        self.classify_pairs(&pairs, &new_scope);

        for (o, n) in pairs {
            if has_children(self.old, o) || has_children(self.new, n) {
                self.match_children(o, n)?;
            }
        }
        Ok(())
    }

    /// Pair children with equal kind and identity key. Returns the old
    /// children left over.
    fn pair_by_key(&mut self, old_scope: &[DeclId], new_scope: &[DeclId]) -> Scope {
        let (old, new) = (self.old, self.new);
        let mut by_key: FxHashMap<(DeclKind, &DeclKey), DeclId> = new_scope
            .iter()
            .map(|&n| ((new.kind(n), &new.node(n).key), n))
            .collect();
        let mut leftover = Scope::new();
        for &o in old_scope {
            let node = old.node(o);
            match by_key.remove(&(node.kind, &node.key)) {
                Some(n) => self.link(o, n),
                None => leftover.push(o),
            }
        }
        leftover
    }

    /// Pair leftover children of the same kind whose keys differ: by
    /// position for parameters and valueless enum members, by content for
    /// everything else.
    fn pair_by_similarity(&mut self, leftover_old: Scope, new_scope: &[DeclId]) -> Scope {
        let mut unmatched_new: Scope = new_scope
            .iter()
            .copied()
            .filter(|&n| !self.is_new_matched(n))
            .collect();
        let mut still_unmatched = Scope::new();

        for o in leftover_old {
            let kind = self.old.kind(o);
            let candidate = unmatched_new.iter().position(|&n| {
                self.new.kind(n) == kind
                    && match kind {
                        DeclKind::Parameter | DeclKind::TypeParameter => {
                            ordinal(self.old, o) == ordinal(self.new, n)
                        }
                        DeclKind::EnumMember
                            if self.old.node(o).initializer.is_none()
                                && self.new.node(n).initializer.is_none() =>
                        {
                            ordinal(self.old, o) == ordinal(self.new, n)
                        }
                        _ => is_similar(self.old, o, self.new, n),
                    }
            });
            match candidate {
                Some(i) => {
                    let n = unmatched_new.remove(i);
                    tracing::trace!(?o, ?n, %kind, "paired by similarity");
                    self.link(o, n);
                }
                None => still_unmatched.push(o),
            }
        }
        still_unmatched
    }

    /// Pair field groups by how many of their variables were paired with
    /// each other. Unpaired groups are deleted or inserted on their own;
    /// their variables carry separate edits.
    fn pair_groups(&mut self, old_parent: DeclId, new_parent: DeclId) {
        let old_groups = groups(self.old, old_parent);
        let mut new_groups = groups(self.new, new_parent);

        for og in old_groups {
            let best = new_groups
                .iter()
                .enumerate()
                .map(|(i, &ng)| {
                    let overlap = self
                        .old
                        .children(og)
                        .iter()
                        .filter(|&&v| {
                            self.new_of(v)
                                .is_some_and(|nv| self.new.parent(nv) == Some(ng))
                        })
                        .count();
                    (i, overlap)
                })
                .filter(|&(_, overlap)| overlap > 0)
                .max_by_key(|&(i, overlap)| (overlap, std::cmp::Reverse(i)));

            match best {
                Some((i, _)) => {
                    let ng = new_groups.remove(i);
                    self.link(og, ng);
                    let changes =
                        ContentChange::between(self.old.node(og), self.new.node(ng));
                    if !changes.is_empty() {
                        self.edits.push(Edit::pair(
                            EditKind::Update,
                            (self.old, og),
                            (self.new, ng),
                            changes,
                        ));
                    }
                }
                None => self.edits.push(Edit::delete(self.old, og)),
            }
        }
        for ng in new_groups {
            self.edits.push(Edit::insert(self.new, ng));
        }
    }

    /// Emit edits for paired scope members: `Move` when the parent
    /// changed, `Reorder` when the sibling order changed, `Update` when
    /// only content changed.
    fn classify_pairs(&mut self, pairs: &[(DeclId, DeclId)], new_scope: &[DeclId]) {
        let moved: SmallVec<[bool; 16]> = pairs
            .iter()
            .map(|&(o, n)| {
                let expected = self.old.parent(o).and_then(|p| self.new_of(p));
                self.new.parent(n) != expected
            })
            .collect();

        let positions: Vec<usize> = pairs
            .iter()
            .zip(&moved)
            .filter(|&(_, &m)| !m)
            .map(|(&(_, n), _)| new_scope.iter().position(|&x| x == n).unwrap_or(0))
            .collect();
        let mut stable = stable_positions(&positions).into_iter();

        for (&(o, n), &is_moved) in pairs.iter().zip(&moved) {
            let changes = ContentChange::between(self.old.node(o), self.new.node(n));
            let kind = if is_moved {
                Some(EditKind::Move)
            } else if !stable.next().unwrap_or(true) {
                Some(EditKind::Reorder)
            } else if !changes.is_empty() {
                Some(EditKind::Update)
            } else {
                None
            };
            if let Some(kind) = kind {
                self.edits
                    .push(Edit::pair(kind, (self.old, o), (self.new, n), changes));
            }
        }
    }

    /// Pair subtrees that left their parent: same kind and key anywhere in
    /// the document. Repeats until no more pairs form, since matching a
    /// moved pair's children can leave new subtrees pending.
    fn match_across_parents(&mut self) -> Result<(), Cancelled> {
        let (old, new) = (self.old, self.new);
        loop {
            self.cancel.check()?;
            let mut old_pending = std::mem::take(&mut self.pending_old);
            let mut new_pending = std::mem::take(&mut self.pending_new);
            let mut pairs: Vec<(DeclId, DeclId)> = Vec::new();

            old_pending.retain(|&o| {
                let node = old.node(o);
                if !is_relocatable(node.kind) {
                    return true;
                }
                let found = new_pending.iter().position(|&n| {
                    let candidate = new.node(n);
                    candidate.kind == node.kind && candidate.key == node.key
                });
                match found {
                    Some(i) => {
                        pairs.push((o, new_pending.remove(i)));
                        false
                    }
                    None => true,
                }
            });

            self.pending_old = old_pending;
            self.pending_new = new_pending;
            if pairs.is_empty() {
                return Ok(());
            }

            for (o, n) in pairs {
                tracing::trace!(?o, ?n, "paired across parents");
                self.link(o, n);
                let changes = ContentChange::between(old.node(o), new.node(n));
                self.edits
                    .push(Edit::pair(EditKind::Move, (old, o), (new, n), changes));
                self.match_children(o, n)?;
            }
        }
    }

    fn delete_subtree(&mut self, root: DeclId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            self.edits.push(Edit::delete(self.old, id));
            stack.extend(self.old.children(id).iter().rev().copied());
        }
    }

    fn insert_subtree(&mut self, root: DeclId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            self.edits.push(Edit::insert(self.new, id));
            stack.extend(self.new.children(id).iter().rev().copied());
        }
    }
}

/// Children matched under one parent: field groups are looked through so
/// variables pair individually across regroupings.
fn scope(tree: &DeclTree, parent: DeclId) -> Scope {
    if tree.kind(parent).is_grouping() {
        return Scope::new();
    }
    tree.members(parent).collect()
}

fn groups(tree: &DeclTree, parent: DeclId) -> Scope {
    tree.children(parent)
        .iter()
        .copied()
        .filter(|&c| tree.kind(c).is_grouping())
        .collect()
}

/// Position among same-kind siblings.
fn ordinal(tree: &DeclTree, id: DeclId) -> Option<usize> {
    let kind = tree.kind(id);
    let parent = tree.parent(id)?;
    tree.children(parent)
        .iter()
        .filter(|&&c| tree.kind(c) == kind)
        .position(|&c| c == id)
}

fn has_children(tree: &DeclTree, id: DeclId) -> bool {
    !tree.children(id).is_empty() && !tree.kind(id).is_grouping()
}

/// Kinds that keep their identity when moved to another parent.
fn is_relocatable(kind: DeclKind) -> bool {
    kind == DeclKind::Namespace || kind.is_type() || (kind.is_member() && !kind.is_grouping())
}
