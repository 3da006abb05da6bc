//! Ingestion-time normalization of legacy artifact shapes.

use serde::{Deserialize, Deserializer};

use super::ImageRef;

/// Public path prefix of images the build pipeline stores locally.
pub const PORTFOLIO_IMAGE_PREFIX: &str = "assets/images/portfolio/";

/// Extension every convertible raster ends up with after the build.
pub const CONVERTED_EXTENSION: &str = "webp";

const CONVERTIBLE: [&str; 3] = ["png", "jpg", "jpeg"];

/// Whether a file name or URL ends in a raster extension the build converts.
/// GIFs are deliberately excluded so animations survive.
pub fn is_convertible_raster(path: &str) -> bool {
	extension(path).is_some_and(|ext| CONVERTIBLE.iter().any(|c| ext.eq_ignore_ascii_case(c)))
}

/// Rewrite `name.png|jpg|jpeg` to `name.webp`; other paths are returned as-is.
pub fn to_converted_path(path: &str) -> String {
	match extension(path) {
		Some(ext) if is_convertible_raster(path) => {
			format!("{}.{}", &path[..path.len() - ext.len() - 1], CONVERTED_EXTENSION)
		}
		_ => path.to_string(),
	}
}

fn extension(path: &str) -> Option<&str> {
	let name = path.rsplit('/').next().unwrap_or(path);
	let (_, ext) = name.rsplit_once('.')?;
	Some(ext)
}

/// Local portfolio images always point at their converted file.
fn normalize_local(url: String) -> String {
	if url.contains(PORTFOLIO_IMAGE_PREFIX) {
		to_converted_path(&url)
	} else {
		url
	}
}

impl<'de> Deserialize<'de> for ImageRef {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Bare(String),
			Object { url: String },
		}

		let url = match Raw::deserialize(deserializer)? {
			Raw::Bare(url) | Raw::Object { url } => url,
		};
		Ok(ImageRef {
			url: normalize_local(url),
		})
	}
}

pub(super) fn image_url<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	let url = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
	Ok(normalize_local(url))
}

/// Heading levels arrive as `2` or as the source's block type name `"heading_2"`.
pub(super) fn heading_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Number(u8),
		Name(String),
	}

	match Raw::deserialize(deserializer)? {
		Raw::Number(level) => Ok(level.clamp(1, 6)),
		Raw::Name(name) => name
			.trim_start_matches("heading_")
			.trim_start_matches('h')
			.parse::<u8>()
			.map(|level| level.clamp(1, 6))
			.map_err(|_| serde::de::Error::custom(format!("invalid heading level {name:?}"))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::content::{Block, ContentItem};

	#[test]
	fn image_refs_accept_both_shapes() {
		let images: Vec<ImageRef> =
			serde_json::from_str(r#"["https://cdn/a.png", {"url": "https://cdn/b.jpg"}]"#).unwrap();
		assert_eq!(images[0].url, "https://cdn/a.png");
		assert_eq!(images[1].url, "https://cdn/b.jpg");
	}

	#[test]
	fn local_rasters_point_at_converted_files() {
		let item: ContentItem = serde_json::from_str(
			r#"{
				"id": "x",
				"images": ["assets/images/portfolio/ab_12.PNG", {"url": "assets/images/portfolio/ab_13.gif"}],
				"imageUrl": "assets/images/portfolio/ab_12.jpeg"
			}"#,
		)
		.unwrap();
		assert_eq!(item.images[0].url, "assets/images/portfolio/ab_12.webp");
		assert_eq!(item.images[1].url, "assets/images/portfolio/ab_13.gif");
		assert_eq!(item.image_url, "assets/images/portfolio/ab_12.webp");
	}

	#[test]
	fn null_image_url_is_empty() {
		let item: ContentItem = serde_json::from_str(r#"{"id": "x", "imageUrl": null}"#).unwrap();
		assert_eq!(item.image_url, "");
	}

	#[test]
	fn legacy_heading_levels() {
		let block: Block = serde_json::from_str(r#"{"type": "heading", "level": "heading_3", "text": "t"}"#).unwrap();
		assert_eq!(block, Block::Heading { level: 3, text: "t".into() });
		let block: Block = serde_json::from_str(r#"{"type": "heading", "level": "h1", "text": "t"}"#).unwrap();
		assert_eq!(block, Block::Heading { level: 1, text: "t".into() });
	}

	#[test]
	fn converted_path_only_touches_rasters() {
		assert_eq!(to_converted_path("dir/a.jpg"), "dir/a.webp");
		assert_eq!(to_converted_path("dir/a.gif"), "dir/a.gif");
		assert_eq!(to_converted_path("dir.v2/noext"), "dir.v2/noext");
		assert!(is_convertible_raster("x.JPEG"));
		assert!(!is_convertible_raster("x.webp"));
	}
}
