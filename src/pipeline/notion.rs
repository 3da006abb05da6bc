//! Content source access.
//!
//! [`ContentSource`] is the two paginated queries the build needs. The
//! production implementation talks to the Notion REST API; tests use
//! in-memory fakes. Block and record payloads stay as JSON values because the
//! build only reads a handful of fields out of each block type.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use super::error::SourceError;

/// Notion API version the queries are written against.
pub const NOTION_VERSION: &str = "2022-06-28";
const API_BASE: &str = "https://api.notion.com/v1";

/// One page of results plus the continuation cursor.
#[derive(Clone, Debug, Deserialize)]
pub struct Page<T> {
	pub results: Vec<T>,
	#[serde(default)]
	pub has_more: bool,
	#[serde(default)]
	pub next_cursor: Option<String>,
}

impl<T> Page<T> {
	/// Cursor for the next request, if there is one.
	pub fn continuation(&self) -> Option<&str> {
		self.next_cursor.as_deref().filter(|_| self.has_more)
	}
}

/// A block as returned by the source. The type-specific payload sits under
/// the key named by `kind`.
#[derive(Clone, Debug, Deserialize)]
pub struct RawBlock {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub has_children: bool,
	#[serde(flatten)]
	pub fields: Map<String, Value>,
}

impl RawBlock {
	/// Build a block from its type and payload.
	pub fn new(id: impl Into<String>, kind: impl Into<String>, payload: Value) -> Self {
		let kind = kind.into();
		let mut fields = Map::new();
		fields.insert(kind.clone(), payload);
		Self {
			id: id.into(),
			kind,
			has_children: false,
			fields,
		}
	}

	pub fn with_children(mut self) -> Self {
		self.has_children = true;
		self
	}

	pub fn payload(&self) -> Option<&Value> {
		self.fields.get(&self.kind)
	}

	/// The block's `rich_text` array, empty when absent.
	pub fn rich_text(&self) -> &[Value] {
		self.payload()
			.and_then(|p| p.get("rich_text"))
			.and_then(Value::as_array)
			.map_or(&[], Vec::as_slice)
	}

	/// URL of a file-or-external payload (images, videos).
	pub fn media_url(&self) -> Option<&str> {
		let payload = self.payload()?;
		["file", "external"]
			.iter()
			.find_map(|k| payload.get(k).and_then(|v| v.get("url")).and_then(Value::as_str))
			.filter(|url| !url.is_empty())
	}

	/// Plain `url` field (embeds, bookmarks).
	pub fn url(&self) -> Option<&str> {
		self.payload()
			.and_then(|p| p.get("url"))
			.and_then(Value::as_str)
			.filter(|url| !url.is_empty())
	}
}

/// A collection row.
#[derive(Clone, Debug, Deserialize)]
pub struct RawRecord {
	pub id: String,
	#[serde(default)]
	pub properties: Map<String, Value>,
}

/// Concatenated `plain_text` of a rich-text array.
pub fn plain_text(rich: &[Value]) -> String {
	rich.iter()
		.filter_map(|t| t.get("plain_text").and_then(Value::as_str))
		.collect()
}

/// Hyperlinks carried by spans of a rich-text array, in order.
pub fn inline_links(rich: &[Value]) -> Vec<String> {
	rich.iter()
		.filter_map(|t| {
			t.get("href")
				.and_then(Value::as_str)
				.or_else(|| t.pointer("/text/link/url").and_then(Value::as_str))
		})
		.filter(|url| !url.is_empty())
		.map(str::to_string)
		.collect()
}

/// Paginated read access to the content source.
#[async_trait]
pub trait ContentSource: Send + Sync {
	/// Direct children of a block or page.
	async fn list_children(&self, block_id: &str, cursor: Option<&str>) -> Result<Page<RawBlock>, SourceError>;

	/// Rows of a collection.
	async fn query_collection(&self, collection_id: &str, cursor: Option<&str>)
	-> Result<Page<RawRecord>, SourceError>;
}

/// Every row of a collection, following cursors.
pub async fn query_all(source: &dyn ContentSource, collection_id: &str) -> Result<Vec<RawRecord>, SourceError> {
	let mut records = Vec::new();
	let mut cursor: Option<String> = None;
	loop {
		let page = source.query_collection(collection_id, cursor.as_deref()).await?;
		cursor = page.continuation().map(str::to_string);
		records.extend(page.results);
		if cursor.is_none() {
			return Ok(records);
		}
	}
}

/// Notion REST client.
pub struct NotionClient {
	http: reqwest::Client,
	token: String,
	base_url: String,
	page_size: u32,
}

impl NotionClient {
	pub fn new(token: impl Into<String>, page_size: u32) -> Result<Self, SourceError> {
		let token = token.into();
		if token.trim().is_empty() {
			return Err(SourceError::MissingToken);
		}
		Ok(Self {
			http: reqwest::Client::builder().build()?,
			token,
			base_url: API_BASE.to_string(),
			page_size,
		})
	}

	/// Point the client at another API root.
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, SourceError> {
		let response = request
			.bearer_auth(&self.token)
			.header("Notion-Version", NOTION_VERSION)
			.send()
			.await?;
		let status = response.status();
		let url = response.url().to_string();
		let body = response.text().await?;
		if status == reqwest::StatusCode::UNAUTHORIZED {
			return Err(SourceError::Unauthorized(body));
		}
		if !status.is_success() {
			return Err(SourceError::Status {
				status: status.as_u16(),
				url,
				body,
			});
		}
		Ok(serde_json::from_str(&body)?)
	}
}

#[async_trait]
impl ContentSource for NotionClient {
	async fn list_children(&self, block_id: &str, cursor: Option<&str>) -> Result<Page<RawBlock>, SourceError> {
		debug!("notion: children of {block_id}");
		let mut query = vec![("page_size", self.page_size.to_string())];
		if let Some(cursor) = cursor {
			query.push(("start_cursor", cursor.to_string()));
		}
		let request = self
			.http
			.get(format!("{}/blocks/{block_id}/children", self.base_url))
			.query(&query);
		self.send(request).await
	}

	async fn query_collection(
		&self,
		collection_id: &str,
		cursor: Option<&str>,
	) -> Result<Page<RawRecord>, SourceError> {
		debug!("notion: query {collection_id}");
		let mut body = json!({ "page_size": self.page_size });
		if let Some(cursor) = cursor {
			body["start_cursor"] = json!(cursor);
		}
		let request = self
			.http
			.post(format!("{}/databases/{collection_id}/query", self.base_url))
			.json(&body);
		self.send(request).await
	}
}
