//! Mind-map structure and radial layout.
//!
//! The tree comes from the outline text shipped inside the content artifact,
//! or from the packaged default when that text is missing or malformed. The
//! layout is a pure function of the tree and a [`LayoutConfig`], so it can be
//! computed and tested without any presentation surface.

mod layout;
mod outline;
mod tree;

pub use layout::{Bounds, LayoutConfig, LayoutEdge, LayoutNode, MindmapLayout, polar};
pub use outline::{OutlineError, parse_outline};
pub use tree::{DEFAULT_ROOT_NAME, DepthTag, MindmapNode, default_tree, resolve_tree};
