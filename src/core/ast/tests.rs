use super::*;

fn sample_file() -> (ParsedFile, NodeId, NodeId, NodeId) {
    let mut b = FileBuilder::new("sample.cs");
    let root = b.root();
    let class = b.open(root, "class", NodeFlags::land());
    b.leaf(class, "name", "Bar");
    b.text("{");
    b.newline();
    let function = b.open(class, "function", NodeFlags::land());
    b.leaf(function, "name", "foo");
    let body = b.open(function, "body", NodeFlags::hidden());
    b.leaf(body, "stmt", "return");
    b.leaf(body, "number", "1");
    b.close(body);
    b.close(function);
    b.newline();
    b.text("}");
    b.close(class);
    (b.finish(), class, function, body)
}

#[test]
fn test_builder_links_parents_and_children() {
    let (file, class, function, body) = sample_file();
    let tree = &file.tree;

    assert_eq!(tree.parent(function), Some(class));
    assert_eq!(tree.parent(body), Some(function));
    assert_eq!(tree.children(class).len(), 2);
    assert_eq!(tree.ancestors(body).collect::<Vec<_>>(), vec![function, class, tree.root()]);
}

#[test]
fn test_builder_records_spans_and_lines() {
    let (file, class, function, body) = sample_file();

    assert_eq!(file.node_text(body), "return 1");
    assert_eq!(file.node_text(function), "foo return 1");
    assert_eq!(file.tree.node(function).line(), 2);
    assert_eq!(file.tree.node(class).line(), 1);
    assert_eq!(file.end_line(class), 3);
    assert_eq!(file.line_count(), 3);
}

#[test]
fn test_nodes_of_kind_are_in_preorder() {
    let (file, class, function, _) = sample_file();
    assert_eq!(file.tree.nodes_of_kind("class"), vec![class]);
    assert_eq!(file.tree.nodes_of_kind("function"), vec![function]);
    assert_eq!(file.tree.landmarks(), vec![class, function]);
}

#[test]
fn test_innermost_landmark_prefers_smallest_span() {
    let (file, class, function, _) = sample_file();
    assert_eq!(file.innermost_landmark_at_line(2, None), Some(function));
    assert_eq!(file.innermost_landmark_at_line(2, Some("class")), Some(class));
    assert_eq!(file.innermost_landmark_at_line(40, None), None);
}

#[test]
fn test_custom_block_range_strips_markers() {
    let mut b = FileBuilder::new("blocks.cs");
    let root = b.root();
    let block = b.open(root, CUSTOM_BLOCK_KIND, NodeFlags::land());
    b.leaf(block, "start", "#region");
    let inner = b.leaf(block, "name", "Helpers");
    b.leaf(block, "end", "#endregion");
    b.close(block);
    let file = b.finish();

    assert_eq!(file.tree.custom_block_range(block), &[inner]);
    assert_eq!(file.tree.custom_block_range(root), &[block]);
}

#[test]
fn test_custom_block_range_resolves_through_body() {
    let mut b = FileBuilder::new("blocks.rs");
    let root = b.root();
    let block = b.open(root, CUSTOM_BLOCK_KIND, NodeFlags::land());
    b.leaf(block, "start", "helpers");
    let body = b.open(block, CUSTOM_BLOCK_BODY_KIND, NodeFlags::hidden());
    let first = b.leaf(body, "item", "alpha");
    let second = b.leaf(body, "item", "beta");
    b.close(body);
    b.leaf_with(block, "end", &["#endregion"], NodeFlags::hidden());
    b.close(block);
    let file = b.finish();

    assert_eq!(file.tree.custom_block_range(block), &[first, second]);
}

#[test]
fn test_foreign_ids_are_tolerated() {
    let (file, ..) = sample_file();
    let foreign = NodeId(10_000);
    assert!(file.tree.get(foreign).is_none());
    assert!(file.tree.children(foreign).is_empty());
    assert_eq!(file.node_text(foreign), "");
}
