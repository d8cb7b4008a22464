//! Deltas between consecutive states, and states surviving a snapshot.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use verdict_conformance::{init_tracing, Project, UnitScript};
use verdict_delta::{compute_delta, DeltaCategory, DeltaKind};
use verdict_state::snapshot::{freeze, freeze_to_file, thaw, thaw_from_file};
use verdict_structure::{MethodInfo, Reference, TypeDescriptor};

fn class_a(with_foo: bool) -> TypeDescriptor {
    let a = TypeDescriptor::class("p.A");
    if with_foo {
        a.with_method(MethodInfo::new("foo", Vec::<&str>::new(), "V"))
    } else {
        a
    }
}

fn b_script(extra: Option<&str>) -> UnitScript {
    let script = UnitScript::new()
        .produces(TypeDescriptor::class("p.B"))
        .uses_type("p.A")
        .references(Reference::method("foo", 0));
    match extra {
        Some(name) => script.references(Reference::type_ref(name)),
        None => script,
    }
}

fn project() -> Project {
    let mut project = Project::new();
    project.write("p", "A.java", UnitScript::new().produces(class_a(true)));
    project.write("p", "B.java", b_script(None));
    project.build().unwrap();
    project
}

#[test]
fn state_against_itself_is_unchanged() {
    init_tracing();
    let project = project();

    let delta = compute_delta(&project.state, &project.state, &[]);

    assert!(delta.is_unchanged());
    assert_eq!(delta.lookup(&["types", "p", "p/A.java"]), Some(DeltaKind::Same));
}

#[test]
fn structural_change_shows_under_types() {
    init_tracing();
    let mut project = project();
    let before = project.state.clone();

    project.write("p", "A.java", UnitScript::new().produces(class_a(false)));
    project.build().unwrap();
    let delta = compute_delta(&before, &project.state, &[]);

    assert_eq!(delta.lookup(&["types", "p", "p/A.java"]), Some(DeltaKind::Changed));
    assert_eq!(delta.lookup(&["types", "p", "p/B.java"]), Some(DeltaKind::Same));
    assert_eq!(delta.lookup(&["binaries", "p", "p/B.java"]), Some(DeltaKind::Same));
    assert_eq!(delta.lookup(&["namespaces", "p"]), Some(DeltaKind::Same));
}

#[test]
fn new_content_with_same_shape_shows_under_binaries() {
    init_tracing();
    let mut project = project();
    let before = project.state.clone();

    project.write("p", "B.java", b_script(Some("java.lang.String")));
    project.build().unwrap();
    let delta = compute_delta(&before, &project.state, &[]);

    assert_eq!(delta.lookup(&["types", "p", "p/B.java"]), Some(DeltaKind::Same));
    assert_eq!(delta.lookup(&["binaries", "p", "p/B.java"]), Some(DeltaKind::Changed));
    assert_eq!(delta.lookup(&["binaries"]), Some(DeltaKind::Changed));
    assert_eq!(delta.lookup(&["types"]), Some(DeltaKind::Same));
}

#[test]
fn membership_changes_show_under_namespaces() {
    init_tracing();
    let mut project = project();
    let before = project.state.clone();

    project.write("q", "Q.java", UnitScript::new().produces(TypeDescriptor::class("q.Q")));
    project.build().unwrap();
    let delta = compute_delta(&before, &project.state, &[]);

    assert_eq!(delta.lookup(&["namespaces", "q"]), Some(DeltaKind::Added));
    assert_eq!(delta.lookup(&["namespaces", "q", "q/Q.java"]), Some(DeltaKind::Added));
    assert_eq!(delta.lookup(&["namespaces", "p"]), Some(DeltaKind::Same));

    let changed: BTreeSet<DeltaCategory> = delta.changes().map(|entry| entry.category).collect();
    assert_eq!(changed, DeltaCategory::ALL.into_iter().collect());
}

#[test]
fn thawed_state_keeps_building() {
    init_tracing();
    let mut project = project();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.vrdt");

    freeze_to_file(&project.state, &path).unwrap();
    let thawed = thaw_from_file(&path).unwrap();
    assert_eq!(thawed.generation(), project.state.generation());
    assert_eq!(thawed.descriptors(), project.state.descriptors());
    assert_eq!(thawed.sources(), project.state.sources());
    assert!(compute_delta(&project.state, &thawed, &[]).is_unchanged());

    project.state = thawed;
    project.write("p", "A.java", UnitScript::new().produces(class_a(false)));
    project.build().unwrap();

    let compiled: Vec<String> = project.compiler.compiled().into_iter().collect();
    assert_eq!(compiled, vec!["p/A.java", "p/B.java"]);
}

#[test]
fn snapshot_bytes_are_stable() {
    init_tracing();
    let project = project();

    let first = freeze(&project.state).unwrap();
    let second = freeze(&thaw(&first).unwrap()).unwrap();

    assert_eq!(first, second);
}
