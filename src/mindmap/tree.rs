//! Static mind-map hierarchy.

use std::fmt;
use std::sync::LazyLock;

use log::error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::outline::parse_outline;

/// Outline shipped with the site, used whenever the content artifact has no
/// usable structure of its own.
const DEFAULT_OUTLINE: &str = include_str!("default_tree.txt");

/// Title of the centre node in the packaged tree.
pub const DEFAULT_ROOT_NAME: &str = "나의 신념";

static DEFAULT_TREE: LazyLock<MindmapNode> = LazyLock::new(|| match parse_outline(DEFAULT_OUTLINE) {
	Ok(tree) => tree,
	Err(e) => {
		error!("mindmap: packaged outline is invalid ({e}), using a bare root");
		MindmapNode::new(DEFAULT_ROOT_NAME, DepthTag::Center)
	}
});

/// The packaged fallback tree.
pub fn default_tree() -> &'static MindmapNode {
	&DEFAULT_TREE
}

/// Nominal depth tag carried by each node (`"center"`, `"depth1"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DepthTag {
	Center,
	Depth(u8),
}

impl DepthTag {
	pub fn from_depth(depth: usize) -> Self {
		match depth {
			0 => DepthTag::Center,
			d => DepthTag::Depth(u8::try_from(d).unwrap_or(u8::MAX)),
		}
	}
}

impl fmt::Display for DepthTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DepthTag::Center => f.write_str("center"),
			DepthTag::Depth(d) => write!(f, "depth{d}"),
		}
	}
}

impl Serialize for DepthTag {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for DepthTag {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		if raw == "center" {
			return Ok(DepthTag::Center);
		}
		raw.strip_prefix("depth")
			.and_then(|d| d.parse::<u8>().ok())
			.map(DepthTag::Depth)
			.ok_or_else(|| serde::de::Error::custom(format!("invalid depth tag {raw:?}")))
	}
}

/// A named node of the mind-map. The name is the join key into the content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MindmapNode {
	pub name: String,
	#[serde(rename = "type")]
	pub tag: DepthTag,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<MindmapNode>,
}

impl MindmapNode {
	pub fn new(name: impl Into<String>, tag: DepthTag) -> Self {
		Self {
			name: name.into(),
			tag,
			children: Vec::new(),
		}
	}

	/// Builder-style helper for literal trees.
	pub fn with_children(mut self, children: Vec<MindmapNode>) -> Self {
		self.children = children;
		self
	}

	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// Number of nodes in this subtree, including `self`.
	pub fn node_count(&self) -> usize {
		1 + self.children.iter().map(MindmapNode::node_count).sum::<usize>()
	}

	/// Visit every node depth-first in declaration order with its depth.
	pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a MindmapNode, usize)) {
		fn rec<'a>(node: &'a MindmapNode, depth: usize, visit: &mut impl FnMut(&'a MindmapNode, usize)) {
			visit(node, depth);
			for child in &node.children {
				rec(child, depth + 1, visit);
			}
		}
		rec(self, 0, visit);
	}
}

/// Pick the tree to display: the artifact's outline when it parses, otherwise
/// the packaged default.
pub fn resolve_tree(outline: Option<&str>) -> MindmapNode {
	match outline.map(parse_outline) {
		Some(Ok(tree)) => tree,
		Some(Err(e)) => {
			log::warn!("mindmap: content outline rejected ({e}), using packaged tree");
			default_tree().clone()
		}
		None => default_tree().clone(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn packaged_tree_parses() {
		let tree = default_tree();
		assert_eq!(tree.name, DEFAULT_ROOT_NAME);
		assert_eq!(tree.tag, DepthTag::Center);
		assert_eq!(tree.children.len(), 7);
		assert_eq!(tree.node_count(), 112);
	}

	#[test]
	fn depth_tags_round_trip_through_json() {
		let node = MindmapNode::new("Root", DepthTag::Center)
			.with_children(vec![MindmapNode::new("A", DepthTag::Depth(1))]);
		let json = serde_json::to_string(&node).unwrap();
		assert_eq!(json, r#"{"name":"Root","type":"center","children":[{"name":"A","type":"depth1"}]}"#);
		let back: MindmapNode = serde_json::from_str(&json).unwrap();
		assert_eq!(back, node);
	}

	#[test]
	fn malformed_outline_falls_back() {
		let tree = resolve_tree(Some("제목: orphan"));
		assert_eq!(tree.name, DEFAULT_ROOT_NAME);
		assert!(!tree.is_leaf());
	}

	#[test]
	fn walk_reports_depths_in_order() {
		let tree = MindmapNode::new("R", DepthTag::Center).with_children(vec![
			MindmapNode::new("A", DepthTag::Depth(1))
				.with_children(vec![MindmapNode::new("A1", DepthTag::Depth(2))]),
			MindmapNode::new("B", DepthTag::Depth(1)),
		]);
		let mut seen = Vec::new();
		tree.walk(&mut |node, depth| seen.push((node.name.clone(), depth)));
		assert_eq!(
			seen,
			vec![("R".into(), 0), ("A".into(), 1), ("A1".into(), 2), ("B".into(), 1)]
		);
	}
}
