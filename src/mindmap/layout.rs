//! Radial (polar-coordinate) tree layout.
//!
//! The root sits at the origin and owns the full angular span. Each node's
//! children split its span into equal slices in declaration order, and a node
//! at depth `d` is placed on ring `d * radial_step` at the middle of its slice.
//! Angles are in degrees with 0 pointing up, increasing clockwise on screen.

use std::f64::consts::PI;

use super::tree::{DepthTag, MindmapNode};

/// Ring spacing and angular span of a layout.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Distance between successive depth rings, in content pixels.
	pub radial_step: f64,
	/// Sweep in degrees, zero pointing up.
	pub start_angle: f64,
	pub end_angle: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			radial_step: 250.0,
			start_angle: 0.0,
			end_angle: 360.0,
		}
	}
}

impl LayoutConfig {
	/// Spacing used by the roots page, where nodes carry image previews.
	pub fn page() -> Self {
		Self {
			radial_step: 450.0,
			..Self::default()
		}
	}
}

/// A positioned tree node.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
	pub name: String,
	pub tag: DepthTag,
	/// Ring index, zero at the centre.
	pub depth: usize,
	pub x: f64,
	pub y: f64,
	/// Angular slice owned by this node and its subtree, in degrees.
	pub start_angle: f64,
	pub end_angle: f64,
	/// Index of the parent in [`MindmapLayout::nodes`]. Non-owning.
	pub parent: Option<usize>,
}

impl LayoutNode {
	/// Angular width of this node's slice, in degrees.
	pub fn span(&self) -> f64 {
		self.end_angle - self.start_angle
	}

	pub fn mid_angle(&self) -> f64 {
		self.start_angle + self.span() / 2.0
	}
}

/// Parent to child connection, as indices into [`MindmapLayout::nodes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutEdge {
	pub source: usize,
	pub target: usize,
}

/// Axis-aligned box around every node position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

impl Bounds {
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}
}

/// Flat layout output: nodes in depth-first order (root first) plus edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MindmapLayout {
	pub nodes: Vec<LayoutNode>,
	pub edges: Vec<LayoutEdge>,
}

/// Cartesian point for `radius` at `angle` degrees, 0 pointing up.
pub fn polar(radius: f64, angle: f64) -> (f64, f64) {
	let rad = (angle - 90.0) * PI / 180.0;
	(radius * rad.cos(), radius * rad.sin())
}

impl MindmapLayout {
	/// Lay out `tree`. Pure: the same tree and config always give the same output.
	pub fn compute(tree: &MindmapNode, config: &LayoutConfig) -> Self {
		let mut layout = Self::default();
		layout.place(tree, config, 0, None, config.start_angle, config.end_angle);
		layout
	}

	fn place(
		&mut self,
		node: &MindmapNode,
		config: &LayoutConfig,
		depth: usize,
		parent: Option<usize>,
		start: f64,
		end: f64,
	) {
		let (x, y) = if depth == 0 {
			(0.0, 0.0)
		} else {
			polar(depth as f64 * config.radial_step, start + (end - start) / 2.0)
		};

		let idx = self.nodes.len();
		self.nodes.push(LayoutNode {
			name: node.name.clone(),
			tag: node.tag,
			depth,
			x,
			y,
			start_angle: start,
			end_angle: end,
			parent,
		});
		if let Some(source) = parent {
			self.edges.push(LayoutEdge { source, target: idx });
		}

		if node.children.is_empty() {
			return;
		}
		let slice = (end - start) / node.children.len() as f64;
		for (i, child) in node.children.iter().enumerate() {
			let child_start = start + slice * i as f64;
			// The last slice ends exactly on the parent's end angle.
			let child_end = if i + 1 == node.children.len() {
				end
			} else {
				child_start + slice
			};
			self.place(child, config, depth + 1, Some(idx), child_start, child_end);
		}
	}

	/// The centre node, if the tree was not empty.
	pub fn root(&self) -> Option<&LayoutNode> {
		self.nodes.first()
	}

	/// Index of the first node with exactly this name.
	pub fn find(&self, name: &str) -> Option<usize> {
		self.nodes.iter().position(|n| n.name == name)
	}

	/// Indices of the direct children of `idx`.
	pub fn children_of(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
		self.edges
			.iter()
			.filter(move |e| e.source == idx)
			.map(|e| e.target)
	}

	/// Bounding box of node centres. Empty layouts give a zero box.
	pub fn bounds(&self) -> Bounds {
		let Some(first) = self.nodes.first() else {
			return Bounds::default();
		};
		self.nodes.iter().fold(
			Bounds {
				min_x: first.x,
				min_y: first.y,
				max_x: first.x,
				max_y: first.y,
			},
			|b, n| Bounds {
				min_x: b.min_x.min(n.x),
				min_y: b.min_y.min(n.y),
				max_x: b.max_x.max(n.x),
				max_y: b.max_y.max(n.y),
			},
		)
	}
}
