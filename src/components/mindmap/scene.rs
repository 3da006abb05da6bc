//! Scene description: positioned, labelled nodes and edges ready to draw.
//!
//! A scene is built from a [`MindmapLayout`] and the content lookup. Layout
//! coordinates are centred on the root; the scene shifts them into a
//! non-negative content box with padding so the viewport can fit and centre
//! it. The canvas renderer only reads scenes, and hit testing works on them
//! directly, so both stay testable without a browser.

use crate::mindmap::MindmapLayout;
use crate::navigation::{ContentLookup, NavigationConfig};

use super::scale::ScaledValues;

/// Margin around the outermost node centres, in content pixels.
pub const SCENE_PADDING: f64 = 300.0;

/// How a node is drawn.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeVisual {
	/// Resolved content with at least one image.
	Preview { image_url: String },
	/// Label-only point.
	Marker,
}

/// A layout node placed in canvas content space.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
	pub name: String,
	pub depth: usize,
	/// Content coordinates, shifted so the padded bounds start at the origin.
	pub x: f64,
	pub y: f64,
	pub visual: NodeVisual,
	pub parent: Option<usize>,
}

impl SceneNode {
	pub fn is_preview(&self) -> bool {
		matches!(self.visual, NodeVisual::Preview { .. })
	}

	/// Drawn radius at the current zoom.
	pub fn radius(&self, scaled: &ScaledValues) -> f64 {
		if self.is_preview() {
			scaled.preview_radius
		} else {
			scaled.marker_radius
		}
	}
}

/// Everything the renderer needs for one document: nodes, edges and content size.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub nodes: Vec<SceneNode>,
	/// `(parent, child)` index pairs.
	pub edges: Vec<(usize, usize)>,
	/// Padded content extent.
	pub width: f64,
	pub height: f64,
	home: Option<usize>,
}

impl Scene {
	pub fn build(layout: &MindmapLayout, lookup: &ContentLookup<'_>, nav: &NavigationConfig) -> Self {
		let bounds = layout.bounds();
		let (dx, dy) = (SCENE_PADDING - bounds.min_x, SCENE_PADDING - bounds.min_y);

		let nodes: Vec<SceneNode> = layout
			.nodes
			.iter()
			.map(|node| {
				let visual = match lookup.get(&node.name).and_then(|entry| entry.preview_image()) {
					Some(url) if !url.is_empty() => NodeVisual::Preview {
						image_url: url.to_string(),
					},
					_ => NodeVisual::Marker,
				};
				SceneNode {
					name: node.name.clone(),
					depth: node.depth,
					x: node.x + dx,
					y: node.y + dy,
					visual,
					parent: node.parent,
				}
			})
			.collect();

		let home = nodes
			.iter()
			.position(|n| nav.beliefs_titles.iter().any(|t| t == n.name.trim()))
			.or(if nodes.is_empty() { None } else { Some(0) });

		Self {
			edges: layout.edges.iter().map(|e| (e.source, e.target)).collect(),
			nodes,
			width: bounds.width() + 2.0 * SCENE_PADDING,
			height: bounds.height() + 2.0 * SCENE_PADDING,
			home,
		}
	}

	/// Node the camera flies to on first load: the beliefs node, else the root.
	pub fn home_node(&self) -> Option<&SceneNode> {
		self.home.and_then(|idx| self.nodes.get(idx))
	}

	/// Nearest node whose disc (plus slop) contains content point `(cx, cy)`.
	pub fn node_at(&self, cx: f64, cy: f64, scaled: &ScaledValues) -> Option<usize> {
		self.nodes
			.iter()
			.enumerate()
			.filter_map(|(idx, node)| {
				let dist = (node.x - cx).hypot(node.y - cy);
				(dist <= node.radius(scaled) + scaled.hit_slop).then_some((idx, dist))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(idx, _)| idx)
	}

	/// Distinct preview image URLs in node order.
	pub fn image_urls(&self) -> Vec<&str> {
		let mut urls: Vec<&str> = Vec::new();
		for node in &self.nodes {
			if let NodeVisual::Preview { image_url } = &node.visual {
				if !urls.contains(&image_url.as_str()) {
					urls.push(image_url);
				}
			}
		}
		urls
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mindmap::scale::ScaleConfig;
	use crate::content::{ContentItem, ImageRef, PortfolioDocument};
	use crate::mindmap::{DepthTag, LayoutConfig, MindmapNode};

	fn scene() -> Scene {
		let tree = MindmapNode::new("나의 신념", DepthTag::Center).with_children(vec![
			MindmapNode::new("Pictured", DepthTag::Depth(1)),
			MindmapNode::new("Plain", DepthTag::Depth(1)),
		]);
		let doc = PortfolioDocument {
			roots: vec![ContentItem {
				id: "1".into(),
				title: "pictured".into(),
				images: vec![ImageRef::new("a.webp")],
				..Default::default()
			}],
			..Default::default()
		};
		let layout = MindmapLayout::compute(&tree, &LayoutConfig { radial_step: 100.0, ..Default::default() });
		Scene::build(&layout, &ContentLookup::new(&doc), &NavigationConfig::default())
	}

	#[test]
	fn content_box_is_padded_and_non_negative() {
		let s = scene();
		assert!((s.width - (200.0 + 2.0 * SCENE_PADDING)).abs() < 1e-9);
		for node in &s.nodes {
			assert!(node.x >= SCENE_PADDING - 1e-9 && node.y >= SCENE_PADDING - 1e-9);
		}
		// Root keeps its offset from the children.
		let root = &s.nodes[0];
		assert!((s.nodes[1].x - root.x - 100.0).abs() < 1e-9);
	}

	#[test]
	fn previews_follow_resolved_images() {
		let s = scene();
		assert_eq!(s.nodes[0].visual, NodeVisual::Marker);
		assert_eq!(
			s.nodes[1].visual,
			NodeVisual::Preview {
				image_url: "a.webp".into()
			}
		);
		assert_eq!(s.nodes[2].visual, NodeVisual::Marker);
		assert_eq!(s.image_urls(), ["a.webp"]);
		assert_eq!(s.home_node().map(|n| n.name.as_str()), Some("나의 신념"));
	}

	#[test]
	fn hit_test_picks_nearest_node() {
		let s = scene();
		let scaled = ScaledValues::new(&ScaleConfig::default(), 1.0);
		let plain = &s.nodes[2];
		assert_eq!(s.node_at(plain.x + 3.0, plain.y, &scaled), Some(2));
		assert_eq!(s.node_at(0.0, 0.0, &scaled), None);
	}
}
