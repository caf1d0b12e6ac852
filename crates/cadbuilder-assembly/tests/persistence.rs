use cadbuilder_assembly::{AssemblyError, NewItem, NewProject, Store};
use cadbuilder_ir::CategoryLabel;
use cadbuilder_math::Pose;

#[test]
fn save_and_reopen_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workspace.json");

    let mut store = Store::new();
    let cat = store.add_category("Conveyors", "belt parts", "box").unwrap();
    let comp = store
        .add_component("roller", "roller.glb", CategoryLabel::Roller, Some(cat))
        .unwrap();
    let project = store.create_project(NewProject {
        name: "line 1".into(),
        owner: Some("ana".into()),
        ..Default::default()
    });
    let base = store
        .add_item(
            project,
            NewItem {
                pose: Pose::at([0.0, 0.0, 10.0]).unwrap(),
                ..NewItem::new(comp)
            },
        )
        .unwrap();
    let child = store
        .add_item(
            project,
            NewItem {
                parent: Some(base),
                pose: Pose::at([1.0, 0.0, 0.0]).unwrap(),
                ..NewItem::new(comp)
            },
        )
        .unwrap();
    store.save(&path).unwrap();

    let reopened = Store::open(&path).unwrap();
    assert_eq!(reopened.workspace(), store.workspace());
    let w = reopened.world_transform(project, child).unwrap();
    assert_eq!(w.origin(), cadbuilder_math::Point3::new(1.0, 0.0, 10.0));

    // Ids keep counting after a reload.
    let mut reopened = reopened;
    let next = reopened.create_project(NewProject::default());
    assert!(next > child);
}

#[test]
fn open_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.json");
    match Store::open(&path) {
        Err(AssemblyError::Io { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn open_corrupt_file_is_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(Store::open(&path), Err(AssemblyError::Json(_))));
}

/// Two root items in one project, written to `path` after `edit` runs.
fn write_edited(path: &std::path::Path, edit: impl FnOnce(&mut cadbuilder_ir::Project, u64, u64)) -> (u64, u64) {
    let mut store = Store::new();
    let comp = store
        .add_component("frame", "frame.glb", CategoryLabel::Frame, None)
        .unwrap();
    let project = store.create_project(NewProject::default());
    let a = store.add_item(project, NewItem::new(comp)).unwrap();
    let b = store.add_item(project, NewItem::new(comp)).unwrap();

    let mut workspace = store.workspace().clone();
    edit(workspace.projects.get_mut(&project).unwrap(), a, b);
    std::fs::write(path, workspace.to_json().unwrap()).unwrap();
    (project, a)
}

#[test]
fn open_rejects_parent_loop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loop.json");
    write_edited(&path, |p, a, b| {
        p.item_mut(a).unwrap().parent = Some(b);
        p.item_mut(b).unwrap().parent = Some(a);
    });
    assert!(matches!(
        Store::open(&path),
        Err(AssemblyError::CircularReference(_))
    ));
}

#[test]
fn open_rejects_dangling_parent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dangling.json");
    write_edited(&path, |p, a, _| {
        p.item_mut(a).unwrap().parent = Some(9999);
    });
    assert!(matches!(
        Store::open(&path),
        Err(AssemblyError::ParentNotInProject { parent: 9999, .. })
    ));
}

#[test]
fn open_accepts_valid_tree_and_removes_subtree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.json");
    let (project, a) = write_edited(&path, |p, a, b| {
        p.item_mut(b).unwrap().parent = Some(a);
    });
    let mut store = Store::open(&path).unwrap();
    assert_eq!(store.remove_item(project, a).unwrap().len(), 2);
}
