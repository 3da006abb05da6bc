//! Portfolio artifact data model.
//!
//! The build pipeline writes a [`PortfolioDocument`] as `portfolio.json`; the
//! site reads it back through the same types. Deserialization is the single
//! ingestion step: legacy shapes (bare-string images, `"heading_2"` levels,
//! unconverted local raster paths) are normalized here so nothing downstream
//! ever branches on them.

mod normalize;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use normalize::{CONVERTED_EXTENSION, PORTFOLIO_IMAGE_PREFIX, is_convertible_raster, to_converted_path};

/// Denormalized portfolio content, one build run's output.
///
/// Every fixed category is always present (possibly empty). The
/// `detailed_portfolios` keys are display titles that mind-map nodes join on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioDocument {
	/// Featured projects shown as the card strip.
	#[serde(default)]
	pub branches: Vec<ContentItem>,
	#[serde(default)]
	pub stem: Vec<ContentItem>,
	#[serde(default)]
	pub career: Vec<ContentItem>,
	/// Items the mind map's inner rings join to.
	#[serde(default)]
	pub roots: Vec<ContentItem>,
	#[serde(default)]
	pub beliefs: Vec<ContentItem>,
	/// Named sub-galleries, keyed by the source collection's title, in source order.
	#[serde(default)]
	pub detailed_portfolios: IndexMap<String, Vec<ContentItem>>,
	/// Mind-map outline text shipped with the content, if the source has one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub roots_structure: Option<String>,
	#[serde(default)]
	pub meta: ArtifactMeta,
}

impl PortfolioDocument {
	/// All items across the flat categories and every detailed gallery.
	pub fn item_count(&self) -> usize {
		self.branches.len()
			+ self.stem.len()
			+ self.career.len()
			+ self.roots.len()
			+ self.beliefs.len()
			+ self.detailed_portfolios.values().map(Vec::len).sum::<usize>()
	}

	/// True when no bucket holds an item.
	pub fn is_empty(&self) -> bool {
		self.item_count() == 0
	}
}

/// Build metadata stored alongside the content.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
	/// Mind-map nodes whose names matched no content at build time.
	#[serde(default)]
	pub warnings: Vec<DriftWarning>,
}

/// A mind-map node that does not join to any content item or gallery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftWarning {
	pub node: String,
	pub depth: usize,
}

/// One content record (a row of a source collection).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
	/// Source record id.
	pub id: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub description: String,
	/// Flattened plain text, one entry per paragraph/heading.
	#[serde(default)]
	pub content: Vec<String>,
	/// Typed blocks in source order, used by the modal.
	#[serde(default)]
	pub rich_content: Vec<Block>,
	#[serde(default)]
	pub images: Vec<ImageRef>,
	/// Cover image, or empty.
	#[serde(default, deserialize_with = "normalize::image_url")]
	pub image_url: String,
}

impl ContentItem {
	/// URL of the first image, if the item has any.
	pub fn first_image(&self) -> Option<&str> {
		self.images.first().map(|img| img.url.as_str())
	}

	/// Whether opening this item would show anything at all.
	pub fn has_displayable_content(&self) -> bool {
		!self.images.is_empty() || !self.rich_content.is_empty() || !self.content.is_empty()
	}
}

/// Canonical image reference. Accepts `"url"` or `{"url": "..."}` on input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageRef {
	pub url: String,
}

impl ImageRef {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into() }
	}
}

/// Preview metadata for a bookmark.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMeta {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image: Option<String>,
}

/// One unit of rich content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
	Paragraph {
		text: String,
	},
	Heading {
		#[serde(deserialize_with = "normalize::heading_level")]
		level: u8,
		text: String,
	},
	Video {
		url: String,
	},
	Embed {
		url: String,
	},
	Bookmark {
		url: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		meta: Option<LinkMeta>,
	},
}

impl Block {
	/// Target URL for media and bookmark blocks.
	pub fn url(&self) -> Option<&str> {
		match self {
			Block::Video { url } | Block::Embed { url } | Block::Bookmark { url, .. } => Some(url),
			Block::Paragraph { .. } | Block::Heading { .. } => None,
		}
	}
}
