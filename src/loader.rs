//! Artifact loading for the site.
//!
//! A failed or malformed load never errors out of here: the caller gets an
//! empty [`PortfolioDocument`] and the shell still renders.

use log::{info, warn};

use crate::content::PortfolioDocument;

/// Where the build writes the artifact, relative to the site root.
pub const DATA_URL: &str = "data/portfolio.json";

/// Id of the optional `<script type="application/json">` carrying the artifact inline.
pub const INLINE_DATA_ID: &str = "portfolio-data";

/// Parse artifact JSON, falling back to an empty document.
pub fn parse_document(json: &str) -> PortfolioDocument {
	match serde_json::from_str::<PortfolioDocument>(json) {
		Ok(doc) => {
			info!(
				"loader: {} items, {} detailed galleries",
				doc.item_count(),
				doc.detailed_portfolios.len()
			);
			doc
		}
		Err(e) => {
			warn!("loader: failed to parse portfolio data: {e}");
			PortfolioDocument::default()
		}
	}
}

/// Append a cache-busting `v` query parameter.
pub fn cache_busted_url(url: &str, stamp: u64) -> String {
	let sep = if url.contains('?') { '&' } else { '?' };
	format!("{url}{sep}v={stamp}")
}

#[cfg(target_arch = "wasm32")]
pub use web::{load_inline, load_portfolio};

#[cfg(target_arch = "wasm32")]
mod web {
	use log::{debug, warn};
	use wasm_bindgen::{JsCast, JsValue};
	use wasm_bindgen_futures::JsFuture;
	use web_sys::{HtmlScriptElement, Request, RequestCache, RequestInit, Response};

	use super::{DATA_URL, INLINE_DATA_ID, cache_busted_url, parse_document};
	use crate::content::PortfolioDocument;

	/// Artifact embedded in the page, if the host page carries one.
	pub fn load_inline() -> Option<PortfolioDocument> {
		let document = web_sys::window()?.document()?;
		let script: HtmlScriptElement = document.get_element_by_id(INLINE_DATA_ID)?.dyn_into().ok()?;
		let text = script.text().ok()?;
		debug!("loader: using inline portfolio data");
		Some(parse_document(&text))
	}

	/// Inline data when present, otherwise one cache-busted fetch.
	pub async fn load_portfolio() -> PortfolioDocument {
		if let Some(doc) = load_inline() {
			return doc;
		}
		let url = cache_busted_url(DATA_URL, js_sys::Date::now() as u64);
		match fetch_text(&url).await {
			Ok(text) => parse_document(&text),
			Err(e) => {
				warn!("loader: fetching {url} failed: {e:?}");
				PortfolioDocument::default()
			}
		}
	}

	async fn fetch_text(url: &str) -> Result<String, JsValue> {
		let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
		let opts = RequestInit::new();
		opts.set_method("GET");
		opts.set_cache(RequestCache::NoStore);
		let request = Request::new_with_str_and_init(url, &opts)?;

		let response: Response = JsFuture::from(window.fetch_with_request(&request)).await?.dyn_into()?;
		if !response.ok() {
			return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
		}
		let text = JsFuture::from(response.text()?).await?;
		text.as_string().ok_or_else(|| JsValue::from_str("response body is not text"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn malformed_json_is_empty() {
		assert!(parse_document("{not json").is_empty());
		assert!(parse_document("").is_empty());
	}

	#[test]
	fn parses_items() {
		let doc = parse_document(r#"{"roots": [{"id": "1", "title": "A"}], "detailedPortfolios": {"G": []}}"#);
		assert_eq!(doc.roots[0].title, "A");
		assert!(doc.detailed_portfolios.contains_key("G"));
	}

	#[test]
	fn cache_buster_respects_existing_query() {
		assert_eq!(cache_busted_url("data/portfolio.json", 7), "data/portfolio.json?v=7");
		assert_eq!(cache_busted_url("data/p.json?x=1", 7), "data/p.json?x=1&v=7");
	}
}
