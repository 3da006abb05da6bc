//! Outline grammar for mind-map structures.
//!
//! The content source ships the mind-map as a marker-line text block:
//!
//! ```text
//! outline = { line } ;
//! line    = blank | center | depth | title ;
//! center  = "중심" | "center" ;
//! depth   = DIGITS "차" [ SP ] "연결점" | "depth" SP DIGITS ;
//! title   = ( "제목:" | "title:" ) TEXT ;
//! ```
//!
//! Surrounding whitespace on a line is ignored, so indentation is cosmetic.
//! A `center` or `depth N` marker sets the depth for every following title
//! until the next marker. Exactly one title may sit at the centre; a title at
//! depth `N` attaches to the most recent title at depth `N - 1`, so depths may
//! step back arbitrarily but never skip forward. Anything else is an error:
//! malformed text is rejected, never repaired.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::tree::{DepthTag, MindmapNode};

static DEPTH_MARKER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(?:(\d+)\s*차\s*연결점|(?i:depth)\s+(\d+))$").expect("static regex")
});

const CENTER_MARKERS: [&str; 2] = ["중심", "center"];
const TITLE_PREFIXES: [&str; 2] = ["제목:", "title:"];

/// Reasons an outline is rejected. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutlineError {
	#[error("outline contains no titles")]
	Empty,
	#[error("line {line}: title below the centre before any centre title")]
	MissingCenter { line: usize },
	#[error("line {line}: second centre title {title:?}")]
	DuplicateRoot { line: usize, title: String },
	#[error("line {line}: title before any depth marker")]
	TitleBeforeDepth { line: usize },
	#[error("line {line}: depth {depth} skips past deepest open depth {deepest}")]
	SkippedDepth { line: usize, depth: usize, deepest: usize },
	#[error("line {line}: invalid depth marker {text:?}")]
	InvalidDepth { line: usize, text: String },
	#[error("line {line}: empty title")]
	EmptyTitle { line: usize },
	#[error("line {line}: unrecognized line {text:?}")]
	UnrecognizedLine { line: usize, text: String },
	#[error("centre node {root:?} has no children")]
	NoChildren { root: String },
}

enum Line<'a> {
	Blank,
	Center,
	Depth(usize),
	Title(&'a str),
}

fn classify(line_no: usize, raw: &str) -> Result<Line<'_>, OutlineError> {
	let line = raw.trim();
	if line.is_empty() {
		return Ok(Line::Blank);
	}
	if CENTER_MARKERS.iter().any(|m| line.eq_ignore_ascii_case(m)) {
		return Ok(Line::Center);
	}
	if let Some(caps) = DEPTH_MARKER.captures(line) {
		let digits = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
		return match digits.parse::<usize>() {
			Ok(depth) if depth >= 1 => Ok(Line::Depth(depth)),
			_ => Err(OutlineError::InvalidDepth {
				line: line_no,
				text: line.to_string(),
			}),
		};
	}
	for prefix in TITLE_PREFIXES {
		let matched = line
			.get(..prefix.len())
			.is_some_and(|head| head.eq_ignore_ascii_case(prefix));
		if matched {
			return Ok(Line::Title(line[prefix.len()..].trim()));
		}
	}
	Err(OutlineError::UnrecognizedLine {
		line: line_no,
		text: line.to_string(),
	})
}

struct Pending {
	name: String,
	depth: usize,
	children: Vec<usize>,
}

/// Parse an outline into a tree rooted at its centre title.
pub fn parse_outline(text: &str) -> Result<MindmapNode, OutlineError> {
	let mut nodes: Vec<Pending> = Vec::new();
	// Indices of the open path from the root to the most recent title.
	let mut path: Vec<usize> = Vec::new();
	let mut depth: Option<usize> = None;

	for (idx, raw) in text.lines().enumerate() {
		let line_no = idx + 1;
		match classify(line_no, raw)? {
			Line::Blank => {}
			Line::Center => depth = Some(0),
			Line::Depth(d) => depth = Some(d),
			Line::Title(title) => {
				let Some(d) = depth else {
					return Err(OutlineError::TitleBeforeDepth { line: line_no });
				};
				if title.is_empty() {
					return Err(OutlineError::EmptyTitle { line: line_no });
				}
				if d == 0 {
					if !nodes.is_empty() {
						return Err(OutlineError::DuplicateRoot {
							line: line_no,
							title: title.to_string(),
						});
					}
				} else if nodes.is_empty() {
					return Err(OutlineError::MissingCenter { line: line_no });
				} else if d > path.len() {
					return Err(OutlineError::SkippedDepth {
						line: line_no,
						depth: d,
						deepest: path.len() - 1,
					});
				}

				let id = nodes.len();
				nodes.push(Pending {
					name: title.to_string(),
					depth: d,
					children: Vec::new(),
				});
				path.truncate(d);
				if let Some(&parent) = path.last() {
					nodes[parent].children.push(id);
				}
				path.push(id);
			}
		}
	}

	if nodes.is_empty() {
		return Err(OutlineError::Empty);
	}
	if nodes[0].children.is_empty() {
		return Err(OutlineError::NoChildren {
			root: nodes[0].name.clone(),
		});
	}
	Ok(assemble(&nodes, 0))
}

fn assemble(nodes: &[Pending], id: usize) -> MindmapNode {
	let node = &nodes[id];
	MindmapNode::new(node.name.clone(), DepthTag::from_depth(node.depth))
		.with_children(node.children.iter().map(|&c| assemble(nodes, c)).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_korean_markers() {
		let text = "중심\n제목: 나의 신념\n1차 연결점\n제목: A\n\t2차 연결점\n\t제목: A-1\n\t제목: A-2\n1차 연결점\n제목: B\n";
		let tree = parse_outline(text).unwrap();
		assert_eq!(tree.name, "나의 신념");
		assert_eq!(tree.children.len(), 2);
		assert_eq!(tree.children[0].name, "A");
		assert_eq!(tree.children[0].tag, DepthTag::Depth(1));
		assert_eq!(tree.children[0].children.len(), 2);
		assert_eq!(tree.children[0].children[1].tag, DepthTag::Depth(2));
		assert_eq!(tree.children[1].name, "B");
	}

	#[test]
	fn parses_english_markers() {
		let text = "center\ntitle: Root\ndepth 1\nTitle: One\ndepth 2\ntitle: One.1\ndepth 1\ntitle: Two";
		let tree = parse_outline(text).unwrap();
		assert_eq!(tree.name, "Root");
		assert_eq!(tree.children[0].children[0].name, "One.1");
		assert_eq!(tree.children[1].name, "Two");
	}

	#[test]
	fn stepping_back_several_levels_attaches_to_the_right_parent() {
		let text = "중심\n제목: R\n1차 연결점\n제목: A\n2차 연결점\n제목: A1\n3차 연결점\n제목: A1a\n1차 연결점\n제목: B";
		let tree = parse_outline(text).unwrap();
		assert_eq!(tree.children.len(), 2);
		assert_eq!(tree.children[0].children[0].children[0].name, "A1a");
		assert!(tree.children[1].is_leaf());
	}

	#[test]
	fn rejects_malformed_outlines() {
		assert_eq!(parse_outline(""), Err(OutlineError::Empty));
		assert_eq!(parse_outline("제목: R"), Err(OutlineError::TitleBeforeDepth { line: 1 }));
		assert_eq!(
			parse_outline("1차 연결점\n제목: A"),
			Err(OutlineError::MissingCenter { line: 2 })
		);
		assert_eq!(
			parse_outline("중심\n제목: R\n제목: R2"),
			Err(OutlineError::DuplicateRoot {
				line: 3,
				title: "R2".into()
			})
		);
		assert_eq!(
			parse_outline("중심\n제목: R\n2차 연결점\n제목: X"),
			Err(OutlineError::SkippedDepth {
				line: 4,
				depth: 2,
				deepest: 0
			})
		);
		assert_eq!(
			parse_outline("중심\n제목: R\n0차 연결점"),
			Err(OutlineError::InvalidDepth {
				line: 3,
				text: "0차 연결점".into()
			})
		);
		assert_eq!(
			parse_outline("중심\n제목:   \n"),
			Err(OutlineError::EmptyTitle { line: 2 })
		);
		assert!(matches!(
			parse_outline("중심\n제목: R\n{\"name\": \"x\",}"),
			Err(OutlineError::UnrecognizedLine { line: 3, .. })
		));
		assert_eq!(
			parse_outline("중심\n제목: R"),
			Err(OutlineError::NoChildren { root: "R".into() })
		);
	}
}
