//! Property-based tests for whole edit sessions.
//!
//! Random classes are generated from a small member pool and edited in one
//! specific way; each property pins what the runtime is told for that kind
//! of edit, whatever the surrounding members and capability set:
//! 1. Renaming any declaration reports exactly one `Renamed`, with or
//!    without a body
//! 2. Reordering class members is free; reordering interface members or
//!    value type fields is not
//! 3. Changing only an initializer updates exactly the initializing
//!    constructors
//! 4. Inserting a virtual member is rude on every runtime
//! 5. Inserting a private member needs exactly its capability
//! 6. Rude edits of a reloadable type become one `Replace`

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use enc_ir::{Accessibility, Decl, DeclId, DeclTree, Modifiers, StringInterner, TreeBuilder};
use encc::{Capabilities, RudeEditKind, Session, SessionConfig, SessionOutput};
use proptest::prelude::*;

// -- Generation Strategies --

#[derive(Clone, Debug)]
enum Member {
    Method { body: u64 },
    Field { ty: &'static str, init: Option<u64> },
    Property { ty: &'static str },
}

fn type_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["Integer", "String", "Long"])
}

fn member_strategy() -> impl Strategy<Value = Member> {
    prop_oneof![
        (0u64..3).prop_map(|body| Member::Method { body }),
        (type_name(), prop::option::of(0u64..3))
            .prop_map(|(ty, init)| Member::Field { ty, init }),
        type_name().prop_map(|ty| Member::Property { ty }),
    ]
}

/// Members with distinct names, in declaration order.
fn members_strategy(min: usize) -> impl Strategy<Value = Vec<(&'static str, Member)>> {
    prop::collection::btree_map(
        prop::sample::select(vec!["A", "B", "D", "E", "H", "K"]),
        member_strategy(),
        min..6,
    )
    .prop_map(|members| members.into_iter().collect())
}

/// Where the renamed declaration lives. Apart from `Class`, every member is
/// a declaration without a body or value.
#[derive(Clone, Copy, Debug)]
enum Container {
    Class,
    Interface,
    AbstractClass,
    Enum,
    Module,
}

fn container_strategy() -> impl Strategy<Value = Container> {
    prop::sample::select(vec![
        Container::Class,
        Container::Interface,
        Container::AbstractClass,
        Container::Enum,
        Container::Module,
    ])
}

fn capabilities_strategy() -> impl Strategy<Value = Capabilities> {
    any::<u16>().prop_map(Capabilities::from_bits_truncate)
}

// -- Helpers --

fn session(capabilities: Capabilities) -> Session {
    Session::fresh(capabilities).with_config(SessionConfig::sequential())
}

fn add_member(b: &mut TreeBuilder<'_>, parent: DeclId, name: &str, member: &Member) {
    match member {
        Member::Method { body } => {
            b.add(parent, Decl::method(name).body(*body));
        }
        Member::Field { ty, init } => {
            let decl = Decl::field(name, *ty);
            b.add(parent, init.map_or(decl.clone(), |i| decl.initializer(i)));
        }
        Member::Property { ty } => {
            b.add(parent, Decl::property(name, *ty));
        }
    }
}

fn class(
    interner: &StringInterner,
    type_decl: Decl,
    members: &[(&'static str, Member)],
    extra: impl FnOnce(&mut TreeBuilder<'_>, DeclId),
) -> DeclTree {
    let mut b = TreeBuilder::new(interner);
    let c = b.add(b.root(), type_decl);
    for (name, member) in members {
        add_member(&mut b, c, name, member);
    }
    extra(&mut b, c);
    b.finish().unwrap()
}

fn container(
    interner: &StringInterner,
    container: Container,
    name: &'static str,
    members: &[(&'static str, Member)],
) -> DeclTree {
    let (type_decl, bodyless): (Decl, fn(&str) -> Decl) = match container {
        Container::Class => return class(interner, Decl::class(name), members, |_, _| {}),
        Container::Interface => (Decl::interface(name), |m| Decl::method(m)),
        Container::AbstractClass => (
            Decl::class(name).modifiers(Modifiers::ABSTRACT),
            |m| Decl::method(m).modifiers(Modifiers::ABSTRACT),
        ),
        Container::Enum => (Decl::enumeration(name), |m| Decl::enum_member(m)),
        Container::Module => (Decl::module(name), |m| Decl::declare(m, "kernel32")),
    };
    let mut b = TreeBuilder::new(interner);
    let t = b.add(b.root(), type_decl);
    for (member, _) in members {
        b.add(t, bodyless(member));
    }
    b.finish().unwrap()
}

fn run(session: &Session, old: DeclTree, new: DeclTree) -> SessionOutput {
    session.analyze_versions(&[old], &[new]).unwrap()
}

fn rude_kinds(output: &SessionOutput) -> Vec<RudeEditKind> {
    output.rude_edits().map(|(_, d)| d.kind).collect()
}

fn edits(output: &SessionOutput, interner: &StringInterner) -> Vec<String> {
    let mut edits: Vec<String> = output
        .semantic_edits()
        .into_iter()
        .map(|e| e.display(interner))
        .collect();
    edits.sort();
    edits
}

// -- Properties --

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Renaming the type or one of its members yields one `Renamed`.
    #[test]
    fn rename_reports_exactly_one_renamed(
        members in members_strategy(1),
        target in any::<prop::sample::Index>(),
        rename_type in any::<bool>(),
        shape in container_strategy(),
        capabilities in capabilities_strategy(),
    ) {
        let session = session(capabilities);
        let interner = session.interner();
        let old = container(interner, shape, "C", &members);
        let new = if rename_type {
            container(interner, shape, "Renamed", &members)
        } else {
            let mut renamed = members.clone();
            renamed[target.index(members.len())].0 = "Renamed";
            container(interner, shape, "C", &renamed)
        };
        let output = run(&session, old, new);
        prop_assert_eq!(rude_kinds(&output), vec![RudeEditKind::Renamed]);
    }

    #[test]
    fn reordered_class_members_are_never_rude(
        members in members_strategy(2)
            .prop_flat_map(|m| (Just(m.clone()), Just(m).prop_shuffle())),
    ) {
        let (old_members, new_members) = members;
        let session = session(Capabilities::BASELINE);
        let interner = session.interner();
        let old = class(interner, Decl::class("C"), &old_members, |_, _| {});
        let new = class(interner, Decl::class("C"), &new_members, |_, _| {});
        let output = run(&session, old, new);
        prop_assert!(!output.has_rude_edits());
    }

    #[test]
    fn reordered_interface_members_are_always_moved(
        names in Just(vec!["A", "B", "D", "E"]).prop_shuffle(),
        capabilities in capabilities_strategy(),
    ) {
        prop_assume!(names != ["A", "B", "D", "E"]);
        let session = session(capabilities);
        let interner = session.interner();
        let interface = |order: &[&str]| {
            let mut b = TreeBuilder::new(interner);
            let i = b.add(b.root(), Decl::interface("I"));
            for name in order {
                b.add(i, Decl::method(*name));
            }
            b.finish().unwrap()
        };
        let output = run(&session, interface(&["A", "B", "D", "E"]), interface(&names));
        let kinds = rude_kinds(&output);
        prop_assert!(!kinds.is_empty());
        prop_assert!(kinds.iter().all(|&k| k == RudeEditKind::Moved));
    }

    #[test]
    fn reordered_value_type_fields_are_always_moved(
        names in Just(vec!["a", "b", "c"]).prop_shuffle(),
        capabilities in capabilities_strategy(),
    ) {
        prop_assume!(names != ["a", "b", "c"]);
        let session = session(capabilities);
        let interner = session.interner();
        let fields = |order: &[&str]| {
            let mut b = TreeBuilder::new(interner);
            let s = b.add(b.root(), Decl::structure("S"));
            for name in order {
                b.add(s, Decl::field(*name, "Integer"));
            }
            b.finish().unwrap()
        };
        let output = run(&session, fields(&["a", "b", "c"]), fields(&names));
        let kinds = rude_kinds(&output);
        prop_assert!(!kinds.is_empty());
        prop_assert!(kinds.iter().all(|&k| k == RudeEditKind::Moved));
    }

    /// Only the constructors that run initializers are updated; with none
    /// declared, the implicit one is.
    #[test]
    fn initializer_change_updates_initializing_constructors(
        members in members_strategy(0),
        old_value in 0u64..3,
        new_value in 3u64..6,
        constructors in prop::sample::subsequence(vec!["", "Integer"], 0..=2),
    ) {
        let session = session(Capabilities::BASELINE);
        let interner = session.interner();
        let version = |value: u64| {
            class(interner, Decl::class("C"), &members, |b, c| {
                b.add(c, Decl::field("x", "Integer").initializer(value));
                for (i, param) in constructors.iter().enumerate() {
                    let ctor = b.add(c, Decl::constructor().body(i as u64));
                    if !param.is_empty() {
                        b.add(ctor, Decl::parameter("p", *param));
                    }
                }
            })
        };
        let output = run(&session, version(old_value), version(new_value));

        prop_assert!(!output.has_rude_edits());
        let expected: Vec<String> = if constructors.is_empty() {
            vec!["update C..ctor()".to_owned()]
        } else {
            let mut expected: Vec<String> = constructors
                .iter()
                .map(|param| format!("update C..ctor({param})"))
                .collect();
            expected.sort();
            expected
        };
        prop_assert_eq!(edits(&output, interner), expected);
    }

    #[test]
    fn inserted_virtual_member_is_rude_on_every_runtime(
        members in members_strategy(0),
        modifier in prop::sample::select(vec![
            Modifiers::VIRTUAL,
            Modifiers::ABSTRACT,
            Modifiers::OVERRIDE,
        ]),
        capabilities in capabilities_strategy(),
    ) {
        let session = session(capabilities);
        let interner = session.interner();
        let old = class(interner, Decl::class("C"), &members, |_, _| {});
        let new = class(interner, Decl::class("C"), &members, |b, c| {
            b.add(c, Decl::method("Added").modifiers(modifier).body(9));
        });
        let output = run(&session, old, new);
        prop_assert_eq!(rude_kinds(&output), vec![RudeEditKind::InsertVirtual]);
    }

    #[test]
    fn inserted_private_member_needs_its_capability(
        members in members_strategy(0),
        field in any::<bool>(),
        capabilities in capabilities_strategy(),
    ) {
        let session = session(capabilities);
        let interner = session.interner();
        let added = if field {
            Decl::field("added", "Integer")
        } else {
            Decl::method("Added").body(9)
        };
        let required = if field {
            Capabilities::ADD_INSTANCE_FIELD_TO_EXISTING_TYPE
        } else {
            Capabilities::ADD_METHOD_TO_EXISTING_TYPE
        };
        let old = class(interner, Decl::class("C"), &members, |_, _| {});
        let new = class(interner, Decl::class("C"), &members, |b, c| {
            b.add(c, added.accessibility(Accessibility::Private));
        });
        let output = run(&session, old, new);

        if capabilities.has(required | Capabilities::BASELINE) {
            prop_assert!(!output.has_rude_edits());
            prop_assert_eq!(output.semantic_edits().len(), 1);
        } else {
            let rude: Vec<_> = output.rude_edits().collect();
            prop_assert_eq!(rude.len(), 1);
            prop_assert_eq!(rude[0].1.kind, RudeEditKind::Inserted);
            prop_assert!(rude[0].1.is_unsupported_by_runtime());
        }
    }

    #[test]
    fn rude_edit_of_reloadable_type_becomes_replace(
        members in members_strategy(0),
        delete_field in any::<bool>(),
        capabilities in capabilities_strategy(),
    ) {
        let session = session(capabilities);
        let interner = session.interner();
        let old = class(interner, Decl::class("C").reloadable(), &members, |b, c| {
            b.add(c, Decl::field("kept", "Integer"));
        });
        let new = class(interner, Decl::class("C").reloadable(), &members, |b, c| {
            if !delete_field {
                b.add(c, Decl::field("kept", "Integer"));
                b.add(c, Decl::method("Added").modifiers(Modifiers::VIRTUAL).body(9));
            }
        });
        let output = run(&session, old, new);

        if capabilities.has(Capabilities::NEW_TYPE_DEFINITION | Capabilities::BASELINE) {
            prop_assert!(!output.has_rude_edits());
            prop_assert_eq!(edits(&output, interner), vec!["replace C".to_owned()]);
        } else {
            let expected = if delete_field {
                RudeEditKind::Deleted
            } else {
                RudeEditKind::InsertVirtual
            };
            prop_assert_eq!(rude_kinds(&output), vec![expected]);
        }
    }
}
