//! Layout, hit-testing and repaint behavior of the table engine.

use horizon_proptree::{
    PaintCommand, Point, RecordingPainter, RowHeights, RowModel, SelectionMode, Size,
    TableConfig, TableEngine,
};
use horizon_proptree_core::{
    Document, IdGenerator, NodeKey, NodeKind, NodeValue, ProtocolError, SyncForest,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// R with children A and B, and C under B.
fn scenario_forest() -> (SyncForest, NodeKey, [NodeKey; 3]) {
    let mut forest = SyncForest::with_id_generator(IdGenerator::with_seed(1));
    let a = forest.create_node("A", NodeValue::Checkbox(false));
    let b = forest.create_node("B", NodeValue::Folder);
    let c = forest.create_node("C", NodeValue::EditText("hello".into()));
    let root = forest.create_default("R", NodeKind::Root);
    forest.push_back(root, a);
    forest.push_back(root, b);
    forest.push_back(b, c);
    (forest, root, [a, b, c])
}

/// A forest three levels deep with a mix of leaves and folders.
fn wide_forest() -> (SyncForest, NodeKey) {
    let mut forest = SyncForest::new();
    let root = forest.create_default("root", NodeKind::Root);
    for i in 0..4 {
        let group = forest.create_child(root, format!("group {i}"), NodeValue::Folder);
        for j in 0..i {
            let inner = forest.create_child(group, format!("inner {i}.{j}"), NodeValue::Folder);
            for k in 0..j + 1 {
                forest.create_child(inner, format!("leaf {i}.{j}.{k}"), NodeValue::Checkbox(k % 2 == 0));
            }
        }
    }
    (forest, root)
}

/// Number of nodes below `root` whose ancestors up to `root` are all open.
fn expected_visible(forest: &SyncForest, model: &RowModel, root: NodeKey) -> usize {
    forest
        .descendants(root)
        .filter(|&key| {
            let mut parent = forest.parent(key);
            while let Some(p) = parent {
                if p == root {
                    return true;
                }
                if !model.is_open(p) {
                    return false;
                }
                parent = forest.parent(p);
            }
            false
        })
        .count()
}

fn visible_names(table: &TableEngine) -> Vec<String> {
    table
        .visible_rows()
        .iter()
        .filter_map(|row| table.forest().node(row.node))
        .map(|node| node.name().to_string())
        .collect()
}

#[test]
fn test_open_and_close_scenario() {
    init_tracing();
    let (forest, root, [_, b, _]) = scenario_forest();
    let mut model = RowModel::new(root, RowHeights::default());

    // R is the sentinel and always open.
    model.set_open(root, true);
    model.set_open(b, true);
    model.flatten(&forest);
    let names: Vec<_> = model
        .visible_rows()
        .iter()
        .filter_map(|row| forest.node(row.node))
        .map(|node| node.name())
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);

    model.set_open(b, false);
    model.flatten(&forest);
    assert_eq!(model.len(), 2);

    // The same through the engine.
    let mut table = TableEngine::with_forest(forest, root, TableConfig::default());
    table.add_column("Name", false, 100);
    assert_eq!(visible_names(&table), vec!["A", "B"]);
    assert_eq!(table.toggle_open(1), Some(true));
    assert_eq!(visible_names(&table), vec!["A", "B", "C"]);
    assert_eq!(table.toggle_open(1), Some(false));
    assert_eq!(visible_names(&table), vec!["A", "B"]);
}

#[test]
fn test_row_count_matches_open_ancestors() {
    let (forest, root) = wide_forest();
    let mut model = RowModel::new(root, RowHeights::default());

    model.flatten(&forest);
    assert_eq!(model.len(), expected_visible(&forest, &model, root));

    let groups: Vec<_> = forest.children(root).collect();
    model.set_open(groups[2], true);
    model.set_open(groups[3], true);
    let inner: Vec<_> = forest.children(groups[3]).collect();
    model.set_open(inner[1], true);
    // Open below a closed group: still hidden.
    let hidden: Vec<_> = forest.children(groups[1]).collect();
    model.set_open(hidden[0], true);

    model.flatten(&forest);
    assert_eq!(model.len(), expected_visible(&forest, &model, root));

    model.open_all(&forest);
    model.flatten(&forest);
    assert_eq!(model.len(), forest.descendants(root).count());
}

#[test]
fn test_closing_fully_open_node_removes_its_subtree() {
    let (forest, root) = wide_forest();
    let mut model = RowModel::new(root, RowHeights::default());
    model.open_all(&forest);
    model.flatten(&forest);
    let before = model.len();

    let group = forest.children(root).nth(3).unwrap();
    let subtree = forest.descendants(group).count() + 1;
    let index = model.row_index_of(group).unwrap();
    assert_eq!(model.collapse_row(index), subtree - 1);
    assert_eq!(model.len(), before - (subtree - 1));
    assert!(model.row_index_of(group).is_some());

    // The spliced rows match a fresh flatten.
    let spliced = model.visible_rows().to_vec();
    model.flatten(&forest);
    assert_eq!(model.visible_rows(), spliced.as_slice());
}

#[test]
fn test_fitted_resize_keeps_viewport_width() {
    let (forest, root) = wide_forest();
    let mut table = TableEngine::with_forest(forest, root, TableConfig::default());
    table.add_column("Name", false, 140);
    table.add_column("Id", true, 40);
    table.add_column("Value", false, 140);
    table.add_column("Notes", false, 140);
    table.set_viewport(Size::new(530.0, 300.0));

    let total = |table: &TableEngine| table.columns().iter().map(|c| c.width).sum::<u32>();
    assert_eq!(total(&table), 500);

    for (index, width) in [(0, 300), (2, 5), (3, 1000), (0, 60), (2, 250)] {
        assert!(table.resize_column(index, width));
        assert_eq!(total(&table), 500, "after resizing column {index} to {width}");
        assert!(table.columns().iter().all(|c| c.width >= c.min_width));
        assert_eq!(table.columns()[1].width, 40);
    }
    assert!(!table.resize_column(1, 100));

    table.set_viewport(Size::new(1030.0, 300.0));
    assert_eq!(total(&table), 1000);
}

#[test]
fn test_floating_columns_overflow() {
    let (forest, root) = wide_forest();
    let config = TableConfig::default().with_floating_columns(true);
    let mut table = TableEngine::with_forest(forest, root, config);
    table.add_column("Name", false, 200);
    table.add_column("Value", false, 200);
    table.set_viewport(Size::new(230.0, 300.0));
    assert!(table.resize_column(1, 300));
    assert_eq!(table.content_size().width, 500.0);
    assert!(table.set_scroll(1000, 0));
    assert_eq!(table.scroll(), (300, 0));
}

#[test]
fn test_hit_test_agrees_with_geometry() {
    let (forest, root) = wide_forest();
    let mut table = TableEngine::with_forest(forest, root, TableConfig::default());
    table.add_column("Name", false, 140);
    table.add_column("Value", false, 140);
    table.set_viewport(Size::new(330.0, 120.0));
    table.open_all();
    table.set_scroll(0, 37);

    for row in 0..table.rows().len() {
        for column in 0..table.columns().len() {
            let rect = table.geometry_for(row, column).unwrap();
            let center = Point::new(
                rect.left() + rect.width() / 2.0,
                rect.top() + rect.height() / 2.0,
            );
            let inside_viewport = center.y >= 20.0 && center.y < 120.0;
            let expected = inside_viewport.then_some((row, column));
            assert_eq!(table.hit_test(center), expected, "cell ({row}, {column})");
        }
    }
    assert_eq!(table.geometry_for(table.rows().len(), 0), None);
    assert_eq!(table.geometry_for(0, 2), None);
}

#[test]
fn test_rejected_patch_keeps_rows() {
    let (forest, root, [a, ..]) = scenario_forest();
    let mut table = TableEngine::with_forest(forest, root, TableConfig::default());
    table.add_column("Name", false, 100);
    table.open_all();
    let before = table.visible_rows().to_vec();
    table.take_dirty_rows();
    table.take_repaint_region();

    let patch = Document::parse(
        r#"<Parameter Name="A" Enable="1" Visible="1" Type="4" TypeString="Checkbox" ID="999" Check="1"/>"#,
    )
    .unwrap();
    let err = table.forest_mut().decode_patch(a, &patch).unwrap_err();
    assert!(matches!(err, ProtocolError::IdMismatch { .. } | ProtocolError::UnknownNodeId { .. }));

    assert_eq!(table.visible_rows(), before.as_slice());
    assert_eq!(
        table.forest().node(a).unwrap().value(),
        &NodeValue::Checkbox(false)
    );
    assert!(table.take_dirty_rows().is_empty());
    assert_eq!(table.take_repaint_region(), None);
}

#[test]
fn test_value_patch_repaints_one_row() {
    let (forest, root, [a, ..]) = scenario_forest();
    let mut table = TableEngine::with_forest(forest, root, TableConfig::default());
    table.add_column("Name", false, 100);
    table.open_all();
    let row = table.visible_rows().iter().position(|r| r.node == a).unwrap();
    let id = table.forest().node(a).unwrap().id();
    table.take_dirty_rows();
    table.take_repaint_region();

    let patch = Document::parse(&format!(
        r#"<Parameter Name="A" Enable="1" Visible="1" Type="4" TypeString="Checkbox" ID="{}" Check="1"/>"#,
        id.0
    ))
    .unwrap();
    table.forest_mut().decode_patch(a, &patch).unwrap();

    assert!(!table.needs_full_repaint());
    assert_eq!(table.take_dirty_rows(), vec![row]);
    assert_eq!(table.take_repaint_region(), None);
}

#[test]
fn test_selection_repaints_old_and_new_rows() {
    let (forest, root) = wide_forest();
    let config = TableConfig::default().with_selection_mode(SelectionMode::Row);
    let mut table = TableEngine::with_forest(forest, root, config);
    table.add_column("Name", false, 140);
    table.add_column("Value", false, 140);
    table.take_dirty_rows();

    assert_eq!(table.click(Point::new(40.0, 25.0)), Some((0, 0)));
    assert_eq!(table.take_dirty_rows(), vec![0]);
    assert_eq!(table.click(Point::new(200.0, 85.0)), Some((3, 1)));

    // Only the old and new rows are painted; in row mode the whole new row
    // gets the selection color.
    let mut painter = RecordingPainter::new();
    table.paint(&mut painter);
    assert_eq!(painter.texts(), vec!["Name", "Value", "group 0", "group 3"]);
    let selection = table.config().colors.selection;
    let selected_fills = painter
        .commands()
        .iter()
        .filter(|command| matches!(command, PaintCommand::FillRect(_, color) if *color == selection))
        .count();
    assert_eq!(selected_fills, 2);
    assert_eq!(painter.clip_depth(), 0);
}

#[test]
fn test_config_from_toml_drives_layout() {
    let config = TableConfig::from_toml_str(
        r##"
        floating_columns = true
        show_row_header = false
        column_header_height = 24
        default_row_height = 30
        apply_best_height = false
        "##,
    )
    .unwrap();
    let (forest, root, _) = scenario_forest();
    let mut table = TableEngine::with_forest(forest, root, config);
    table.add_column("Name", false, 100);

    let rect = table.geometry_for(1, 0).unwrap();
    assert_eq!((rect.left(), rect.top(), rect.height()), (0.0, 54.0, 30.0));
    assert_eq!(table.hit_test(Point::new(5.0, 25.0)), Some((0, 0)));
}
