//! Property-based tests for the declaration matcher.
//!
//! Random old/new document pairs are generated from a small name pool so
//! that keys collide often, and the resulting scripts are checked for:
//! 1. Coverage: every node is matched or covered by an insert/delete
//! 2. Exclusivity: no node is covered by more than one edit
//! 3. Reorder neutrality: permuting members yields only reorders

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::collections::BTreeMap;

use enc_ir::{CancellationToken, Decl, DeclTree, StringInterner, TreeBuilder};
use enc_match::{match_trees, EditKind, EditScript};
use proptest::prelude::*;

// -- Generation Strategies --

type TypeSpec = (&'static str, Vec<(&'static str, Member)>);

#[derive(Clone, Debug)]
enum Member {
    Method { body: u64, params: Vec<&'static str> },
    Field { ty: &'static str, init: Option<u64> },
    Property { ty: &'static str },
}

fn type_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["Integer", "String", "Long"])
}

fn member_strategy() -> impl Strategy<Value = Member> {
    prop_oneof![
        (0u64..3, prop::collection::vec(type_name(), 0..3)).prop_map(
            |(body, params)| Member::Method { body, params }
        ),
        (type_name(), prop::option::of(0u64..3))
            .prop_map(|(ty, init)| Member::Field { ty, init }),
        type_name().prop_map(|ty| Member::Property { ty }),
    ]
}

/// Members keyed by name, so no two share a name.
fn type_strategy() -> impl Strategy<Value = BTreeMap<&'static str, Member>> {
    prop::collection::btree_map(
        prop::sample::select(vec!["A", "B", "C", "D", "E", "F"]),
        member_strategy(),
        0..6,
    )
}

fn document_strategy() -> impl Strategy<Value = Vec<TypeSpec>> {
    prop::collection::btree_map(prop::sample::select(vec!["X", "Y", "Z"]), type_strategy(), 0..3)
        .prop_map(|types| {
            types
                .into_iter()
                .map(|(name, members)| (name, members.into_iter().collect()))
                .collect()
        })
}

fn build(interner: &StringInterner, types: &[TypeSpec]) -> DeclTree {
    let mut b = TreeBuilder::new(interner);
    for (type_name, members) in types {
        let t = b.add(b.root(), Decl::class(*type_name));
        for (name, member) in members {
            match member {
                Member::Method { body, params } => {
                    let m = b.add(t, Decl::method(*name).body(*body));
                    for (i, ty) in params.iter().enumerate() {
                        b.add(m, Decl::parameter(format!("p{i}"), *ty));
                    }
                }
                Member::Field { ty, init } => {
                    let decl = Decl::field(*name, *ty);
                    b.add(t, init.map_or(decl.clone(), |i| decl.initializer(i)));
                }
                Member::Property { ty } => {
                    b.add(t, Decl::property(*name, *ty));
                }
            }
        }
    }
    b.finish().expect("generated trees have unique keys")
}

fn check_coverage(
    old: &DeclTree,
    new: &DeclTree,
    script: &EditScript,
) -> Result<(), TestCaseError> {
    let mut old_hits = vec![0usize; old.len()];
    let mut new_hits = vec![0usize; new.len()];
    for edit in script.edits() {
        if let Some(o) = edit.old {
            old_hits[o.index()] += 1;
        }
        if let Some(n) = edit.new {
            new_hits[n.index()] += 1;
        }
    }

    for id in old.ids() {
        prop_assert!(old_hits[id.index()] <= 1, "old {id:?} covered twice");
        match script.new_of(id) {
            Some(n) => {
                prop_assert_eq!(script.old_of(n), Some(id));
                if let Some(edit) = script.edit_of_old(id) {
                    prop_assert!(edit.kind != EditKind::Delete);
                }
            }
            None => {
                let edit = script.edit_of_old(id);
                prop_assert_eq!(edit.map(|e| e.kind), Some(EditKind::Delete));
            }
        }
    }
    for id in new.ids() {
        prop_assert!(new_hits[id.index()] <= 1, "new {id:?} covered twice");
        if script.old_of(id).is_none() {
            let edit = script.edit_of_new(id);
            prop_assert_eq!(edit.map(|e| e.kind), Some(EditKind::Insert));
        }
    }
    Ok(())
}

// -- Property Tests --

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn every_node_is_covered_exactly_once(
        old_doc in document_strategy(),
        new_doc in document_strategy(),
    ) {
        let interner = StringInterner::new();
        let old = build(&interner, &old_doc);
        let new = build(&interner, &new_doc);
        let script = match_trees(&old, &new, &CancellationToken::new()).unwrap();
        check_coverage(&old, &new, &script)?;
    }

    #[test]
    fn permuting_members_only_reorders(
        members in type_strategy(),
        seed in any::<prop::sample::Index>(),
    ) {
        let original: Vec<(&'static str, Member)> = members.into_iter().collect();
        let mut permuted = original.clone();
        if !permuted.is_empty() {
            let k = seed.index(permuted.len());
            permuted.rotate_left(k);
        }

        let interner = StringInterner::new();
        let old = build(&interner, &[("X", original)]);
        let new = build(&interner, &[("X", permuted)]);
        let script = match_trees(&old, &new, &CancellationToken::new()).unwrap();

        for edit in script.edits() {
            prop_assert_eq!(edit.kind, EditKind::Reorder);
            prop_assert!(edit.changes.is_empty());
        }
    }

    #[test]
    fn matching_a_tree_with_itself_is_empty(doc in document_strategy()) {
        let interner = StringInterner::new();
        let old = build(&interner, &doc);
        let new = build(&interner, &doc);
        let script = match_trees(&old, &new, &CancellationToken::new()).unwrap();
        prop_assert!(script.is_empty());
    }
}
