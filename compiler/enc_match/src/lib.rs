//! Declaration matching.
//!
//! Pairs the declarations of the old and new version of one document and
//! describes every difference as a structural [`Edit`]. Matching is
//! top-down: within one parent, children pair by identity key first, then
//! leftover children of the same kind pair by similarity (a renamed method
//! with the same body, a parameter at the same position, a type with mostly
//! the same members). Nodes that changed parent pair in a final pass.
//!
//! The resulting [`EditScript`] covers every node of both trees: a node is
//! either matched without changes or covered by exactly one edit.

mod edit;
mod matcher;
mod reorder;
mod similarity;
mod stack;

pub use edit::{ContentChange, Edit, EditKind, EditScript};
pub use matcher::{match_subtrees, match_trees};
