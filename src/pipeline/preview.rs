//! Bookmark preview metadata from Open Graph tags.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use url::Url;

use crate::content::LinkMeta;

static META_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<meta\s[^>]*>").expect("static regex"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?i)([a-z:_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("static regex")
});
static TITLE_TAG: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("static regex"));

/// Best-effort preview lookup. `None` means "show the bare URL".
#[async_trait]
pub trait PreviewFetcher: Send + Sync {
	async fn fetch(&self, url: &str) -> Option<LinkMeta>;
}

/// Skips previews entirely.
pub struct NoPreviews;

#[async_trait]
impl PreviewFetcher for NoPreviews {
	async fn fetch(&self, _url: &str) -> Option<LinkMeta> {
		None
	}
}

/// Fetches the page and reads its Open Graph tags.
pub struct HttpPreviewFetcher {
	http: reqwest::Client,
}

impl HttpPreviewFetcher {
	pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
		Ok(Self {
			http: reqwest::Client::builder()
				.timeout(timeout)
				.user_agent("Mozilla/5.0 (compatible; roots-portfolio)")
				.build()?,
		})
	}
}

#[async_trait]
impl PreviewFetcher for HttpPreviewFetcher {
	async fn fetch(&self, url: &str) -> Option<LinkMeta> {
		let response = match self.http.get(url).send().await {
			Ok(r) if r.status().is_success() => r,
			Ok(r) => {
				debug!("preview: {url} answered {}", r.status());
				return None;
			}
			Err(e) => {
				debug!("preview: {url} failed: {e}");
				return None;
			}
		};
		let html = response.text().await.ok()?;
		parse_preview(&html, url)
	}
}

/// Title, description and image from a page's head. Relative image URLs are
/// resolved against `page_url`.
pub fn parse_preview(html: &str, page_url: &str) -> Option<LinkMeta> {
	let mut meta = LinkMeta::default();
	for tag in META_TAG.find_iter(html) {
		let mut key = None;
		let mut content = None;
		for attr in ATTRIBUTE.captures_iter(tag.as_str()) {
			let value = attr.get(2).or_else(|| attr.get(3)).map_or("", |m| m.as_str());
			match attr[1].to_ascii_lowercase().as_str() {
				"property" | "name" => key = Some(value.to_ascii_lowercase()),
				"content" => content = Some(decode_entities(value.trim())),
				_ => {}
			}
		}
		let (Some(key), Some(content)) = (key, content) else {
			continue;
		};
		if content.is_empty() {
			continue;
		}
		let slot = match key.as_str() {
			"og:title" | "twitter:title" => &mut meta.title,
			"og:description" | "twitter:description" | "description" => &mut meta.description,
			"og:image" | "twitter:image" => &mut meta.image,
			_ => continue,
		};
		slot.get_or_insert(content);
	}

	if meta.title.is_none() {
		meta.title = TITLE_TAG
			.captures(html)
			.map(|c| decode_entities(c[1].trim()))
			.filter(|t| !t.is_empty());
	}
	if let Some(image) = meta.image.take() {
		meta.image = Url::parse(page_url)
			.and_then(|base| base.join(&image))
			.map(String::from)
			.ok()
			.or(Some(image));
	}

	(meta != LinkMeta::default()).then_some(meta)
}

fn decode_entities(text: &str) -> String {
	text.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_open_graph_tags() {
		let html = r#"<html><head>
			<title>Fallback</title>
			<meta property="og:title" content="Tom &amp; Jerry">
			<meta content='A short blurb' name="description"/>
			<meta property="og:image" content="/img/cover.png">
		</head></html>"#;
		let meta = parse_preview(html, "https://blog.example/posts/1").unwrap();
		assert_eq!(meta.title.as_deref(), Some("Tom & Jerry"));
		assert_eq!(meta.description.as_deref(), Some("A short blurb"));
		assert_eq!(meta.image.as_deref(), Some("https://blog.example/img/cover.png"));
	}

	#[test]
	fn falls_back_to_title_tag() {
		let meta = parse_preview("<title> Plain page </title>", "https://x.example").unwrap();
		assert_eq!(meta.title.as_deref(), Some("Plain page"));
		assert_eq!(meta.image, None);
	}

	#[test]
	fn nothing_useful_is_none() {
		assert_eq!(parse_preview("<html></html>", "https://x.example"), None);
	}
}
