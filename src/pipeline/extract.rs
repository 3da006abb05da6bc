//! Turning resolved blocks into artifact content.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::notion::{RawBlock, inline_links, plain_text};
use crate::content::Block;

static URL_EXTENSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(\w{3,4})$").expect("static regex"));

/// Record properties tried, in order, for the display title.
pub const TITLE_PROPERTIES: [&str; 4] = ["이름", "Name", "Title", "제목"];

const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

/// An image block to fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageTask {
	pub url: String,
	/// File name under the image directory, unique per block.
	pub filename: String,
}

/// Text and rich content of one record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extracted {
	/// Flattened paragraphs and headings.
	pub content: Vec<String>,
	pub rich_content: Vec<Block>,
}

impl Extracted {
	/// First text line, used as the card description.
	pub fn description(&self) -> String {
		self.content.first().cloned().unwrap_or_default()
	}
}

/// Title of a collection row from the first title property present.
pub fn record_title(properties: &Map<String, Value>) -> String {
	TITLE_PROPERTIES
		.iter()
		.find_map(|key| properties.get(*key)?.get("title")?.as_array())
		.map(|rich| plain_text(rich))
		.unwrap_or_default()
}

/// First eight characters of an id with dashes removed.
pub fn page_prefix(page_id: &str) -> String {
	page_id.chars().filter(|c| *c != '-').take(8).collect()
}

/// `<prefix>_<block id without dashes>.<ext>`, extension from the URL path.
pub fn image_filename(prefix: &str, block_id: &str, url: &str) -> String {
	let path = url.split(['?', '#']).next().unwrap_or(url);
	let ext = URL_EXTENSION
		.captures(path)
		.and_then(|c| c.get(1))
		.map_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string(), |m| m.as_str().to_lowercase());
	let block: String = block_id.chars().filter(|c| *c != '-').collect();
	format!("{prefix}_{block}.{ext}")
}

/// Image blocks in document order.
pub fn image_tasks(blocks: &[RawBlock], prefix: &str) -> Vec<ImageTask> {
	blocks
		.iter()
		.filter(|b| b.kind == "image")
		.filter_map(|b| {
			let url = b.media_url()?;
			Some(ImageTask {
				url: url.to_string(),
				filename: image_filename(prefix, &b.id, url),
			})
		})
		.collect()
}

/// Paragraphs, headings, media and bookmarks in document order.
///
/// Hyperlinks inside a paragraph are lifted into bookmark entries right
/// after it. Bookmarks carry no preview metadata yet.
pub fn extract_content(blocks: &[RawBlock]) -> Extracted {
	let mut out = Extracted::default();
	for block in blocks {
		match block.kind.as_str() {
			"paragraph" => {
				let text = plain_text(block.rich_text());
				if text.is_empty() {
					continue;
				}
				out.content.push(text.clone());
				out.rich_content.push(Block::Paragraph { text });
				for url in inline_links(block.rich_text()) {
					out.rich_content.push(Block::Bookmark { url, meta: None });
				}
			}
			kind if kind.starts_with("heading_") => {
				let text = plain_text(block.rich_text());
				if text.is_empty() {
					continue;
				}
				let level = kind["heading_".len()..].parse().unwrap_or(1);
				out.content.push(text.clone());
				out.rich_content.push(Block::Heading { level, text });
			}
			"video" => {
				if let Some(url) = block.media_url() {
					out.rich_content.push(Block::Video { url: url.to_string() });
				}
			}
			"embed" => {
				if let Some(url) = block.url() {
					out.rich_content.push(Block::Embed { url: url.to_string() });
				}
			}
			"bookmark" => {
				if let Some(url) = block.url() {
					out.rich_content.push(Block::Bookmark {
						url: url.to_string(),
						meta: None,
					});
				}
			}
			_ => {}
		}
	}
	out
}

/// Text of the last code block written in `language`.
pub fn structure_text(blocks: &[RawBlock], language: &str) -> Option<String> {
	blocks
		.iter()
		.filter(|b| b.kind == "code")
		.filter(|b| {
			b.payload()
				.and_then(|p| p.get("language"))
				.and_then(Value::as_str)
				.is_some_and(|l| l.eq_ignore_ascii_case(language))
		})
		.map(|b| plain_text(b.rich_text()))
		.last()
}

/// `(id, title)` of every linked collection.
pub fn collections(blocks: &[RawBlock]) -> Vec<(String, String)> {
	blocks
		.iter()
		.filter(|b| b.kind == super::walker::COLLECTION_BLOCK)
		.map(|b| {
			let title = b
				.payload()
				.and_then(|p| p.get("title"))
				.and_then(Value::as_str)
				.unwrap_or_default();
			(b.id.clone(), title.to_string())
		})
		.collect()
}
