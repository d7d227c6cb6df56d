//! Tests for the create and patch sync protocol.

use horizon_proptree_core::{
    Document, IdGenerator, NodeId, NodeKey, NodeKind, NodeValue, ProtocolError, Stepped,
    SyncForest,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Root R with A (Checkbox, id 1) and B (Folder, id 2), and C (EditText, id 3)
/// under B. R is created last and gets id 4.
struct Sample {
    forest: SyncForest,
    root: NodeKey,
    a: NodeKey,
    b: NodeKey,
    c: NodeKey,
}

fn sample() -> Sample {
    let mut forest = SyncForest::with_id_generator(IdGenerator::with_seed(1));
    let a = forest.create_node("A", NodeValue::Checkbox(false));
    let b = forest.create_node("B", NodeValue::Folder);
    let c = forest.create_node("C", NodeValue::EditText("hello".into()));
    let root = forest.create_default("R", NodeKind::Root);
    forest.push_back(root, a);
    forest.push_back(root, b);
    forest.push_back(b, c);
    Sample {
        forest,
        root,
        a,
        b,
        c,
    }
}

fn values(forest: &SyncForest, root: NodeKey) -> Vec<(NodeId, NodeValue)> {
    std::iter::once(root)
        .chain(forest.descendants(root))
        .filter_map(|key| forest.node(key))
        .map(|node| (node.id(), node.value().clone()))
        .collect()
}

fn shape(forest: &SyncForest, root: NodeKey) -> Vec<(NodeId, Option<NodeId>, NodeKind, String)> {
    std::iter::once(root)
        .chain(forest.descendants(root))
        .filter_map(|key| {
            let node = forest.node(key)?;
            let parent = forest.parent(key).and_then(|p| forest.id_of(p));
            Some((node.id(), parent, node.kind(), node.name().to_string()))
        })
        .collect()
}

#[test]
fn test_create_rebuilds_tree_with_same_ids() {
    init_tracing();
    let Sample { forest, root, .. } = sample();

    let mut remote = SyncForest::new();
    let copy = remote.decode_create(&forest.encode(root).unwrap()).unwrap();

    let c = remote.node_by_id(NodeId(3)).unwrap();
    assert_eq!(remote.node(c).unwrap().kind(), NodeKind::EditText);
    assert_eq!(remote.parent(c).and_then(|p| remote.id_of(p)), Some(NodeId(2)));
    assert_eq!(remote.root_of(c), copy);
    remote.check_invariants(copy);
}

#[test]
fn test_round_trip_preserves_shape_and_values() {
    let Sample { forest, root, .. } = sample();

    let text = forest.encode(root).unwrap().to_xml_string();
    let mut remote = SyncForest::new();
    let copy = remote.decode_create(&Document::parse(&text).unwrap()).unwrap();

    assert_eq!(shape(&remote, copy), shape(&forest, root));
    assert_eq!(values(&remote, copy), values(&forest, root));
}

#[test]
fn test_create_into_parent_appends() {
    let Sample { forest, root, .. } = sample();

    let mut remote = SyncForest::with_id_generator(IdGenerator::with_seed(100));
    let host = remote.create_default("host", NodeKind::Folder);
    let copy = remote
        .decode_create_into(host, &forest.encode(root).unwrap())
        .unwrap();

    assert_eq!(remote.parent(copy), Some(host));
    assert_eq!(remote.last_child(host), Some(copy));
}

#[test]
fn test_patch_with_unknown_id_changes_nothing() {
    init_tracing();
    let Sample { mut forest, root, a, .. } = sample();
    let before = values(&forest, root);

    let mut doc = forest.encode(root).unwrap();
    // Change A so a partial apply would be visible, then point B's element at 999.
    let children = doc.root_mut().children_mut();
    children[0].set_attribute("Check", 1);
    children[1].set_attribute("ID", 999);

    let err = forest.decode_patch(root, &doc).unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownNodeId { id: NodeId(999) }));
    assert_eq!(values(&forest, root), before);
    assert_eq!(forest.node(a).unwrap().value(), &NodeValue::Checkbox(false));
}

#[test]
fn test_patch_updates_values_in_place() {
    init_tracing();
    let Sample {
        mut forest,
        root,
        a,
        c,
        ..
    } = sample();

    let mut remote = SyncForest::new();
    let copy = remote.decode_create(&forest.encode(root).unwrap()).unwrap();

    forest
        .node_mut(a)
        .unwrap()
        .set_value(NodeValue::Checkbox(true));
    forest
        .node_mut(c)
        .unwrap()
        .set_value(NodeValue::EditText("changed".into()));
    forest.node_mut(c).unwrap().set_visible(false);

    remote.decode_patch(copy, &forest.encode(root).unwrap()).unwrap();

    assert_eq!(values(&remote, copy), values(&forest, root));
    let remote_c = remote.node_by_id(NodeId(3)).unwrap();
    assert!(!remote.node(remote_c).unwrap().is_visible());
    assert_eq!(remote.len(), 4);
}

#[test]
fn test_patch_is_idempotent() {
    let Sample { forest, root, .. } = sample();

    let mut remote = SyncForest::new();
    let copy = remote.decode_create(&forest.encode(root).unwrap()).unwrap();
    let doc = forest.encode(root).unwrap();

    remote.decode_patch(copy, &doc).unwrap();
    let once = shape(&remote, copy);
    let once_values = values(&remote, copy);
    remote.decode_patch(copy, &doc).unwrap();

    assert_eq!(shape(&remote, copy), once);
    assert_eq!(values(&remote, copy), once_values);
}

#[test]
fn test_patch_ignores_document_order() {
    let Sample { mut forest, root, b, .. } = sample();

    let mut remote = SyncForest::new();
    let copy = remote.decode_create(&forest.encode(root).unwrap()).unwrap();

    forest.node_mut(b).unwrap().set_name("renamed");
    let mut doc = forest.encode(root).unwrap();
    doc.root_mut().children_mut().reverse();

    remote.decode_patch(copy, &doc).unwrap();
    let remote_b = remote.node_by_id(NodeId(2)).unwrap();
    assert_eq!(remote.node(remote_b).unwrap().name(), "renamed");
    // Topology is never touched by a patch.
    assert_eq!(remote.first_child(copy), remote.node_by_id(NodeId(1)));
}

#[test]
fn test_apply_patch_for_single_node() {
    let Sample { mut forest, root, .. } = sample();
    let spin = forest.create_child(
        root,
        "level",
        NodeValue::IntValuator(Stepped::new(2, 1, 0, 10)),
    );

    let mut doc = forest.encode(spin).unwrap();
    doc.root_mut().set_attribute("Value", 9);
    let target = forest.apply_patch(root, &doc).unwrap();

    assert_eq!(target, spin);
    assert_eq!(
        forest.node(spin).unwrap().value(),
        &NodeValue::IntValuator(Stepped::new(9, 1, 0, 10))
    );
}

#[test]
fn test_create_rejects_duplicate_ids_atomically() {
    init_tracing();
    let Sample { forest, root, .. } = sample();
    let mut doc = forest.encode(root).unwrap();
    // Give C the same id as A.
    doc.root_mut().children_mut()[1].children_mut()[0].set_attribute("ID", 1);

    let mut remote = SyncForest::new();
    let err = remote.decode_create(&doc).unwrap_err();
    assert!(matches!(err, ProtocolError::DuplicateId { id: NodeId(1) }));
    assert!(remote.is_empty());
}

#[test]
fn test_create_rejects_ids_already_in_forest() {
    let Sample { mut forest, root, .. } = sample();
    let doc = forest.encode(root).unwrap();
    let len = forest.len();

    let err = forest.decode_create(&doc).unwrap_err();
    assert!(matches!(err, ProtocolError::DuplicateId { .. }));
    assert_eq!(forest.len(), len);
}

#[test]
fn test_create_rejects_unreservable_id_atomically() {
    init_tracing();
    let Sample { forest, root, .. } = sample();
    let mut doc = forest.encode(root).unwrap();
    doc.root_mut().children_mut()[1].children_mut()[0].set_attribute("ID", u32::MAX);

    let mut remote = SyncForest::with_id_generator(IdGenerator::with_seed(50));
    let err = remote.decode_create(&doc).unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidAttribute { id: Some(id), .. } if id == NodeId(u32::MAX)));
    assert!(remote.is_empty());
    let fresh = remote.create_default("local", NodeKind::Folder);
    assert_eq!(remote.id_of(fresh), Some(NodeId(50)));
}

#[test]
fn test_create_rejects_unknown_kind_atomically() {
    init_tracing();
    let Sample { forest, root, .. } = sample();
    let mut doc = forest.encode(root).unwrap();
    doc.root_mut().children_mut()[1].set_attribute("Type", 3);

    let mut remote = SyncForest::new();
    let err = remote.decode_create(&doc).unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownKind { id: NodeId(2), .. }));
    assert!(remote.is_empty());
}

#[test]
fn test_create_rejects_missing_name() {
    let Sample { forest, a, .. } = sample();
    let mut doc = forest.encode(a).unwrap();
    doc.root_mut().remove_attribute("Name");

    let err = SyncForest::new().decode_create(&doc).unwrap_err();
    assert_eq!(err.to_string(), "missing attribute 'Name' on node 1");
}

#[test]
fn test_parse_rejects_unclosed_document() {
    assert!(matches!(
        Document::parse("<Parameter ID=\"1\">"),
        Err(ProtocolError::Malformed(_))
    ));
}
