//! Mind-map node to content resolution.
//!
//! Nodes join to content by title: exact match first, then a normalized match
//! (trimmed, lowercased, inner whitespace collapsed). There is no fuzzy
//! fallback. A click resolves into a [`ModalView`], a presentation-neutral
//! description of what the modal shows, so the precedence rules are testable
//! without a DOM.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::content::{Block, ContentItem, DriftWarning, PortfolioDocument};
use crate::mindmap::MindmapNode;

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").expect("static regex")
});

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://\S+$").expect("static regex"));

const YOUTUBE_ID_LEN: usize = 11;

/// Titles and tokens that pick a modal layout.
#[derive(Clone, Debug)]
pub struct NavigationConfig {
	/// Exact titles that open the long-form narrative.
	pub beliefs_titles: Vec<String>,
	/// Substring marking a node as the entry to a detailed gallery.
	pub gallery_marker: String,
}

impl Default for NavigationConfig {
	fn default() -> Self {
		Self {
			beliefs_titles: vec!["나의 신념".into(), "My Beliefs".into()],
			gallery_marker: "상세 포트폴리오".into(),
		}
	}
}

/// Join-key normalization: trim, lowercase, collapse inner whitespace.
pub fn normalize_name(name: &str) -> String {
	name.split_whitespace()
		.map(str::to_lowercase)
		.collect::<Vec<_>>()
		.join(" ")
}

/// Video id of a YouTube watch, short, or embed URL.
pub fn youtube_id(url: &str) -> Option<&str> {
	let caps = YOUTUBE_URL.captures(url)?;
	let id = caps.get(2)?.as_str();
	(id.len() == YOUTUBE_ID_LEN).then_some(id)
}

pub fn youtube_thumbnail(id: &str) -> String {
	format!("https://img.youtube.com/vi/{id}/maxresdefault.jpg")
}

pub fn youtube_embed(id: &str) -> String {
	format!("https://www.youtube.com/embed/{id}?autoplay=1")
}

/// Host name shown on link toasts.
pub fn link_domain(url: &str) -> String {
	Url::parse(url)
		.ok()
		.and_then(|u| u.host_str().map(str::to_string))
		.unwrap_or_else(|| "Link".to_string())
}

/// What a node name resolves to.
#[derive(Clone, Copy, Debug)]
pub enum Entry<'a> {
	Item(&'a ContentItem),
	/// A detailed gallery registered under its own key.
	Gallery { key: &'a str, items: &'a [ContentItem] },
}

impl<'a> Entry<'a> {
	/// Thumbnail for the node. Galleries use their first item's first image.
	pub fn preview_image(&self) -> Option<&'a str> {
		match self {
			Entry::Item(item) => item.first_image(),
			Entry::Gallery { items, .. } => items.first().and_then(|i| i.first_image()),
		}
	}

	pub fn title(&self) -> &'a str {
		match self {
			Entry::Item(item) => &item.title,
			Entry::Gallery { key, .. } => key,
		}
	}
}

/// Name index over every content category.
pub struct ContentLookup<'a> {
	doc: &'a PortfolioDocument,
	exact: HashMap<&'a str, Entry<'a>>,
	normalized: HashMap<String, Entry<'a>>,
}

impl<'a> ContentLookup<'a> {
	/// Index every title in `doc`. Earlier registrations win on collisions.
	pub fn new(doc: &'a PortfolioDocument) -> Self {
		let mut lookup = Self {
			doc,
			exact: HashMap::new(),
			normalized: HashMap::new(),
		};
		let flat = [&doc.roots, &doc.stem, &doc.career, &doc.beliefs, &doc.branches];
		let items = flat
			.into_iter()
			.flatten()
			.chain(doc.detailed_portfolios.values().flatten());
		for item in items {
			lookup.register(item.title.trim(), Entry::Item(item));
		}
		for (key, items) in &doc.detailed_portfolios {
			if !items.is_empty() {
				lookup.register(key.trim(), Entry::Gallery { key, items });
			}
		}
		lookup
	}

	// First registration wins.
	fn register(&mut self, title: &'a str, entry: Entry<'a>) {
		if title.is_empty() {
			return;
		}
		self.exact.entry(title).or_insert(entry);
		self.normalized.entry(normalize_name(title)).or_insert(entry);
	}

	/// Exact title first, then the normalized form.
	pub fn get(&self, name: &str) -> Option<Entry<'a>> {
		self.exact
			.get(name)
			.or_else(|| self.exact.get(name.trim()))
			.or_else(|| self.normalized.get(&normalize_name(name)))
			.copied()
	}

	/// Items of the detailed gallery whose key matches `title`.
	pub fn gallery(&self, title: &str) -> Option<(&'a str, &'a [ContentItem])> {
		let wanted = normalize_name(title);
		self.doc
			.detailed_portfolios
			.iter()
			.find(|(key, _)| normalize_name(key) == wanted)
			.map(|(key, items)| (key.as_str(), items.as_slice()))
	}
}

/// One piece of the beliefs narrative.
#[derive(Clone, Debug, PartialEq)]
pub enum NarrativePart {
	Heading { level: u8, text: String },
	Paragraph(String),
	Image(String),
}

/// Body content of a standard modal.
#[derive(Clone, Debug, PartialEq)]
pub enum BodyBlock {
	Heading { level: u8, text: String },
	Paragraph(String),
	/// Non-YouTube video or embed rendered inline.
	Embed { url: String },
}

/// Floating affordance shown beside the modal body.
#[derive(Clone, Debug, PartialEq)]
pub enum Toast {
	Video {
		video_id: String,
		url: String,
		thumbnail: String,
	},
	Link {
		url: String,
		title: String,
		domain: String,
		image: Option<String>,
	},
}

/// Title, images, body text and link toasts of one item.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardView {
	pub title: String,
	pub images: Vec<String>,
	pub body: Vec<BodyBlock>,
	/// Bookmarks pulled out of the body.
	pub toasts: Vec<Toast>,
}

/// Grid of a detailed portfolio.
#[derive(Clone, Debug, PartialEq)]
pub struct GalleryView {
	pub title: String,
	/// Untrimmed gallery key, as stored in the document.
	pub key: String,
	pub items: Vec<ContentItem>,
}

/// Single gallery item opened from the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailView {
	pub title: String,
	pub images: Vec<String>,
	pub paragraphs: Vec<String>,
}

/// What a node click opens.
#[derive(Clone, Debug, PartialEq)]
pub enum ModalView {
	Beliefs { title: String, parts: Vec<NarrativePart> },
	Gallery(GalleryView),
	Standard(StandardView),
}

impl ModalView {
	pub fn title(&self) -> &str {
		match self {
			ModalView::Beliefs { title, .. } => title,
			ModalView::Gallery(g) => &g.title,
			ModalView::Standard(s) => &s.title,
		}
	}
}

/// Resolve a click on the node called `name`. `None` means the click does nothing.
pub fn resolve_click(lookup: &ContentLookup<'_>, name: &str, config: &NavigationConfig) -> Option<ModalView> {
	match lookup.get(name)? {
		Entry::Gallery { key, items } => Some(ModalView::Gallery(GalleryView {
			title: key.trim().to_string(),
			key: key.to_string(),
			items: items.to_vec(),
		})),
		Entry::Item(item) => resolve_item(lookup, item, config),
	}
}

/// Modal for a content item, applying layout precedence.
pub fn resolve_item(lookup: &ContentLookup<'_>, item: &ContentItem, config: &NavigationConfig) -> Option<ModalView> {
	let title = item.title.trim();
	if config.beliefs_titles.iter().any(|t| t == title) {
		return Some(ModalView::Beliefs {
			title: title.to_string(),
			parts: beliefs_narrative(item),
		});
	}
	if title.contains(config.gallery_marker.as_str()) {
		if let Some((key, items)) = lookup.gallery(title).filter(|(_, items)| !items.is_empty()) {
			return Some(ModalView::Gallery(GalleryView {
				title: title.to_string(),
				key: key.to_string(),
				items: items.to_vec(),
			}));
		}
	}
	if !item.has_displayable_content() {
		return None;
	}
	Some(ModalView::Standard(standard_view(item)))
}

/// Images plus rich content, with YouTube media and bookmarks lifted into toasts.
pub fn standard_view(item: &ContentItem) -> StandardView {
	let mut body = Vec::new();
	let mut toasts = Vec::new();

	if item.rich_content.is_empty() {
		body.extend(item.content.iter().cloned().map(BodyBlock::Paragraph));
	}
	for block in &item.rich_content {
		match block {
			Block::Paragraph { text } => {
				let trimmed = text.trim();
				if !trimmed.is_empty() && !BARE_URL.is_match(trimmed) {
					body.push(BodyBlock::Paragraph(text.clone()));
				}
			}
			Block::Heading { level, text } => body.push(BodyBlock::Heading {
				level: *level,
				text: text.clone(),
			}),
			Block::Video { url } | Block::Embed { url } => match youtube_id(url) {
				Some(id) => toasts.push(video_toast(id, url)),
				None if !url.is_empty() => body.push(BodyBlock::Embed { url: url.clone() }),
				None => {}
			},
			Block::Bookmark { url, meta } => match youtube_id(url) {
				Some(id) => toasts.push(video_toast(id, url)),
				None => {
					let meta = meta.clone().unwrap_or_default();
					toasts.push(Toast::Link {
						url: url.clone(),
						title: meta.title.unwrap_or_else(|| url.clone()),
						domain: link_domain(url),
						image: meta.image,
					});
				}
			},
		}
	}

	StandardView {
		title: item.title.trim().to_string(),
		images: item.images.iter().map(|i| i.url.clone()).collect(),
		body,
		toasts,
	}
}

fn video_toast(id: &str, url: &str) -> Toast {
	Toast::Video {
		video_id: id.to_string(),
		url: url.to_string(),
		thumbnail: youtube_thumbnail(id),
	}
}

/// Text blocks of `item` with its images spread evenly between them.
pub fn beliefs_narrative(item: &ContentItem) -> Vec<NarrativePart> {
	let text: Vec<NarrativePart> = if item.rich_content.is_empty() {
		item.content.iter().cloned().map(NarrativePart::Paragraph).collect()
	} else {
		item.rich_content
			.iter()
			.filter_map(|block| match block {
				Block::Paragraph { text } if !text.trim().is_empty() => Some(NarrativePart::Paragraph(text.clone())),
				Block::Heading { level, text } => Some(NarrativePart::Heading {
					level: *level,
					text: text.clone(),
				}),
				_ => None,
			})
			.collect()
	};

	let n = text.len();
	let m = item.images.len();
	// Image j goes after text part slot(j); slot 0 means before any text.
	let slot = |j: usize| (j + 1) * n / (m + 1);
	let mut images = item.images.iter().enumerate().peekable();
	let mut parts = Vec::with_capacity(n + m);
	let mut flush = |after: usize, parts: &mut Vec<NarrativePart>| {
		while let Some((_, img)) = images.next_if(|(j, _)| slot(*j) == after) {
			parts.push(NarrativePart::Image(img.url.clone()));
		}
	};
	flush(0, &mut parts);
	for (i, part) in text.into_iter().enumerate() {
		parts.push(part);
		flush(i + 1, &mut parts);
	}
	parts
}

impl DetailView {
	pub fn from_item(item: &ContentItem) -> Self {
		Self {
			title: item.title.trim().to_string(),
			images: item.images.iter().map(|i| i.url.clone()).collect(),
			paragraphs: item.content.clone(),
		}
	}
}

/// Case-insensitive title substring filter. An empty query keeps everything.
pub fn filter_gallery<'a>(items: &'a [ContentItem], query: &str) -> Vec<&'a ContentItem> {
	let query = query.trim().to_lowercase();
	items
		.iter()
		.filter(|item| query.is_empty() || item.title.to_lowercase().contains(&query))
		.collect()
}

/// Tree nodes whose names resolve to nothing in `doc`.
pub fn detect_drift(tree: &MindmapNode, doc: &PortfolioDocument) -> Vec<DriftWarning> {
	let lookup = ContentLookup::new(doc);
	let mut warnings = Vec::new();
	tree.walk(&mut |node, depth| {
		if lookup.get(&node.name).is_none() {
			warnings.push(DriftWarning {
				node: node.name.clone(),
				depth,
			});
		}
	});
	warnings
}
