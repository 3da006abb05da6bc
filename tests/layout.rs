use roots_portfolio::mindmap::{
	DepthTag, LayoutConfig, MindmapLayout, MindmapNode, default_tree, polar, resolve_tree,
};

const EPS: f64 = 1e-9;

fn leaf(name: &str, depth: u8) -> MindmapNode {
	MindmapNode::new(name, DepthTag::Depth(depth))
}

fn abc() -> MindmapNode {
	MindmapNode::new("Root", DepthTag::Center).with_children(vec![leaf("A", 1), leaf("B", 1), leaf("C", 1)])
}

/// Uneven tree: fan-outs of 0, 1, 2 and 5 at different levels.
fn ragged() -> MindmapNode {
	MindmapNode::new("R", DepthTag::Center).with_children(vec![
		leaf("solo", 1).with_children(vec![leaf("only", 2).with_children(vec![leaf("x", 3), leaf("y", 3)])]),
		leaf("empty", 1),
		leaf("fan", 1).with_children((0..5).map(|i| leaf(&format!("f{i}"), 2)).collect()),
	])
}

#[test]
fn three_children_sit_at_thirds() {
	let layout = MindmapLayout::compute(
		&abc(),
		&LayoutConfig {
			radial_step: 100.0,
			..LayoutConfig::default()
		},
	);
	let expected = [("A", 60.0, 86.602_540_378), ("B", 180.0, 0.0), ("C", 300.0, -86.602_540_378)];
	for (node, (name, angle, x)) in layout.nodes[1..].iter().zip(expected) {
		assert_eq!(node.name, name);
		assert!((node.mid_angle() - angle).abs() < EPS);
		assert!((node.x.hypot(node.y) - 100.0).abs() < 1e-6);
		assert!((node.x - x).abs() < 1e-6, "{name}: x = {}", node.x);
	}
	// A is up and to the right, B straight down, C up and to the left.
	assert!((layout.nodes[1].y + 50.0).abs() < 1e-6);
	assert!((layout.nodes[2].y - 100.0).abs() < 1e-6);
	assert!((layout.nodes[3].y + 50.0).abs() < 1e-6);
}

#[test]
fn child_spans_sum_to_parent_span() {
	for tree in [abc(), ragged(), default_tree().clone()] {
		let layout = MindmapLayout::compute(&tree, &LayoutConfig::default());
		for (idx, parent) in layout.nodes.iter().enumerate() {
			let children: Vec<usize> = layout.children_of(idx).collect();
			if children.is_empty() {
				continue;
			}
			let sum: f64 = children.iter().map(|&c| layout.nodes[c].span()).sum();
			assert!((sum - parent.span()).abs() < 1e-6, "{}: {sum} vs {}", parent.name, parent.span());
			// Slices are contiguous and in declaration order.
			assert!((layout.nodes[children[0]].start_angle - parent.start_angle).abs() < 1e-6);
			for pair in children.windows(2) {
				assert!((layout.nodes[pair[0]].end_angle - layout.nodes[pair[1]].start_angle).abs() < 1e-6);
			}
			assert_eq!(layout.nodes[*children.last().unwrap()].end_angle, parent.end_angle);
		}
	}
}

#[test]
fn positions_follow_depth_and_mid_angle() {
	let config = LayoutConfig {
		radial_step: 137.5,
		..LayoutConfig::default()
	};
	let layout = MindmapLayout::compute(&ragged(), &config);
	for node in layout.nodes.iter().skip(1) {
		let (x, y) = polar(node.depth as f64 * config.radial_step, node.mid_angle());
		assert!((node.x - x).abs() < EPS && (node.y - y).abs() < EPS, "{}", node.name);
	}
}

#[test]
fn root_stays_at_origin() {
	for step in [1.0, 100.0, 450.0, 9999.0] {
		let layout = MindmapLayout::compute(
			&ragged(),
			&LayoutConfig {
				radial_step: step,
				..LayoutConfig::default()
			},
		);
		let root = layout.root().unwrap();
		assert_eq!((root.x, root.y), (0.0, 0.0));
		assert_eq!(root.depth, 0);
	}
}

#[test]
fn single_child_continues_parent_direction() {
	let layout = MindmapLayout::compute(&ragged(), &LayoutConfig::default());
	let solo = layout.find("solo").unwrap();
	let only = layout.find("only").unwrap();
	assert_eq!(layout.nodes[only].start_angle, layout.nodes[solo].start_angle);
	assert_eq!(layout.nodes[only].end_angle, layout.nodes[solo].end_angle);
	assert_eq!(layout.nodes[only].parent, Some(solo));
}

#[test]
fn layout_is_deterministic() {
	let tree = default_tree();
	let a = MindmapLayout::compute(tree, &LayoutConfig::page());
	let b = MindmapLayout::compute(tree, &LayoutConfig::page());
	assert_eq!(a, b);
	assert_eq!(a.nodes.len(), tree.node_count());
	assert_eq!(a.edges.len(), tree.node_count() - 1);
}

#[test]
fn broken_outline_falls_back_to_packaged_tree() {
	let tree = resolve_tree(Some("제목: no centre marker"));
	assert_eq!(&tree, default_tree());
}
