//! Content build pipeline.
//!
//! One run turns the Notion workspace under the root page into
//! `portfolio.json` plus a directory of WebP images:
//!
//! 1. walk the root page, pick up the outline code block and linked collections
//! 2. per collection, per row: walk its blocks, extract content, download images
//! 3. categorize collections into artifact buckets
//! 4. record mind-map nodes that join to nothing (`meta.warnings`)
//! 5. write the artifact, convert images, verify
//!
//! Network access sits behind [`ContentSource`], [`ImageFetcher`] and
//! [`PreviewFetcher`] so runs are reproducible against in-memory fakes.
//! Everything except image downloads happens one step at a time, which keeps
//! bucket membership and order identical across runs of the same source.

pub mod categorize;
pub mod config;
pub mod convert;
pub mod download;
pub mod error;
pub mod extract;
pub mod notion;
pub mod preview;
pub mod walker;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};

pub use categorize::{Bucket, categorize};
pub use config::{BuildConfig, ConvertConfig, DEFAULT_ROOT_PAGE, DownloadConfig};
pub use convert::{ConvertSummary, normalize_images};
pub use download::{DownloadSummary, Downloader, Fetched, HttpImageFetcher, ImageFetcher};
pub use error::{ConvertError, DownloadError, PipelineError, SourceError};
pub use notion::{ContentSource, NotionClient, Page, RawBlock, RawRecord};
pub use preview::{HttpPreviewFetcher, NoPreviews, PreviewFetcher};

use crate::content::{Block, ContentItem, DriftWarning, ImageRef, PortfolioDocument};
use crate::mindmap::resolve_tree;
use crate::navigation::{detect_drift, youtube_id};

/// What a successful run produced.
#[derive(Clone, Debug, Default)]
pub struct BuildReport {
	/// Where the JSON document was written.
	pub artifact: PathBuf,
	/// Collections fetched and placed in the document.
	pub collections: usize,
	/// Collections whose query failed; the run continued without them.
	pub skipped_collections: usize,
	pub items: usize,
	pub downloads: DownloadSummary,
	/// WebP post-pass totals, including stragglers.
	pub conversion: ConvertSummary,
	/// Mind-map nodes with no matching content.
	pub warnings: Vec<DriftWarning>,
}

impl BuildReport {
	/// Log the end-of-run totals at info level.
	pub fn log_summary(&self) {
		info!("pipeline: ----------------------------------------");
		info!("pipeline: artifact     {}", self.artifact.display());
		info!(
			"pipeline: collections  {} ({} skipped), {} items",
			self.collections, self.skipped_collections, self.items
		);
		let d = &self.downloads;
		info!(
			"pipeline: images       {} found, {} downloaded, {} skipped, {} failed",
			d.found, d.downloaded, d.skipped, d.failed
		);
		let c = &self.conversion;
		info!(
			"pipeline: conversion   {} converted, {} reused, {} deleted, {} GIFs kept, {} WebP total",
			c.converted, c.skipped, c.deleted, c.gifs, c.webp
		);
		info!("pipeline: stragglers   {}", c.stragglers.len());
		info!("pipeline: drift        {} unmatched mind-map nodes", self.warnings.len());
		info!("pipeline: ----------------------------------------");
	}
}

/// One build: fetch every collection, resolve its blocks and previews, download
/// and convert the images, then write the document.
pub struct Pipeline {
	source: Arc<dyn ContentSource>,
	previews: Arc<dyn PreviewFetcher>,
	downloader: Downloader,
	config: BuildConfig,
}

impl Pipeline {
	/// Wire the pipeline to its collaborators. Nothing is fetched until [`Pipeline::run`].
	pub fn new(
		source: Arc<dyn ContentSource>,
		images: Arc<dyn ImageFetcher>,
		previews: Arc<dyn PreviewFetcher>,
		config: BuildConfig,
	) -> Self {
		let downloader = Downloader::new(
			images,
			config.download.clone(),
			config.image_dir.clone(),
			config.public_image_prefix.clone(),
		);
		Self {
			source,
			previews,
			downloader,
			config,
		}
	}

	pub fn config(&self) -> &BuildConfig {
		&self.config
	}

	/// Full build: collect, write, convert, verify.
	pub async fn run(&self) -> Result<BuildReport, PipelineError> {
		let data_dir = &self.config.data_dir;
		fs::create_dir_all(data_dir).map_err(|e| PipelineError::io(data_dir, e))?;

		let (doc, mut report) = self.collect().await?;
		let artifact = self.config.artifact_path();
		write_artifact(&doc, &artifact)?;
		info!("pipeline: wrote {}", artifact.display());

		report.conversion = normalize_images(&self.config.image_dir, &self.config.convert)?;
		report.downloads = self.downloader.summary();
		report.artifact = artifact.clone();
		report.log_summary();

		if !report.conversion.stragglers.is_empty() {
			for name in &report.conversion.stragglers {
				error!("pipeline: unconverted after {} passes: {name}", self.config.convert.max_passes);
			}
			return Err(PipelineError::Stragglers(report.conversion.stragglers));
		}
		if !artifact.is_file() {
			return Err(PipelineError::MissingArtifact(artifact));
		}
		Ok(report)
	}

	/// Read the source into a document, downloading images on the way.
	pub async fn collect(&self) -> Result<(PortfolioDocument, BuildReport), PipelineError> {
		let mut doc = PortfolioDocument::default();
		let mut report = BuildReport::default();
		let image_dir = &self.config.image_dir;
		fs::create_dir_all(image_dir).map_err(|e| PipelineError::io(image_dir, e))?;

		info!("pipeline: fetching root page {}", self.config.root_page);
		let blocks = walker::collect_blocks(self.source.as_ref(), &self.config.root_page).await?;
		info!("pipeline: {} blocks on the root page", blocks.len());

		doc.roots_structure = extract::structure_text(&blocks, &self.config.structure_language);
		if doc.roots_structure.is_some() {
			debug!("pipeline: found mind-map outline block");
		}

		let collections = extract::collections(&blocks);
		info!("pipeline: {} collections", collections.len());
		for (id, title) in collections {
			info!("pipeline: collection {title:?}");
			match self.build_collection(&id).await {
				Ok(items) => {
					let bucket = categorize(&title);
					info!("pipeline: {title:?}: {} items -> {bucket:?}", items.len());
					report.collections += 1;
					report.items += items.len();
					categorize::place(&mut doc, bucket, items);
				}
				Err(e) if e.is_fatal() => return Err(e.into()),
				Err(e) => {
					warn!("pipeline: skipping collection {title:?}: {e}");
					report.skipped_collections += 1;
				}
			}
		}

		let tree = resolve_tree(doc.roots_structure.as_deref());
		report.warnings = detect_drift(&tree, &doc);
		for w in &report.warnings {
			warn!("pipeline: mind-map node {:?} (depth {}) matches no content", w.node, w.depth);
		}
		doc.meta.warnings = report.warnings.clone();
		report.downloads = self.downloader.summary();

		Ok((doc, report))
	}

	async fn build_collection(&self, collection_id: &str) -> Result<Vec<ContentItem>, SourceError> {
		let records = notion::query_all(self.source.as_ref(), collection_id).await?;
		debug!("pipeline: {} rows in {collection_id}", records.len());
		let mut items = Vec::with_capacity(records.len());
		for record in &records {
			items.push(self.build_item(record).await?);
		}
		Ok(items)
	}

	async fn build_item(&self, record: &RawRecord) -> Result<ContentItem, SourceError> {
		let title = extract::record_title(&record.properties);
		let blocks = walker::collect_blocks(self.source.as_ref(), &record.id).await?;

		let tasks = extract::image_tasks(&blocks, &extract::page_prefix(&record.id));
		if !tasks.is_empty() {
			debug!("pipeline: {} images in {title:?}", tasks.len());
		}
		let images: Vec<ImageRef> = self
			.downloader
			.download_all(&tasks)
			.await
			.into_iter()
			.map(ImageRef::new)
			.collect();

		let mut extracted = extract::extract_content(&blocks);
		self.attach_previews(&mut extracted.rich_content).await;

		Ok(ContentItem {
			id: record.id.clone(),
			description: extracted.description(),
			image_url: images.first().map(|i| i.url.clone()).unwrap_or_default(),
			title,
			content: extracted.content,
			rich_content: extracted.rich_content,
			images,
		})
	}

	/// Preview metadata for bookmarks, bounded by the preview timeout.
	async fn attach_previews(&self, blocks: &mut [Block]) {
		for block in blocks.iter_mut() {
			let Block::Bookmark { url, meta } = block else {
				continue;
			};
			if youtube_id(url).is_some() {
				continue;
			}
			*meta = tokio::time::timeout(self.config.preview_timeout, self.previews.fetch(url))
				.await
				.unwrap_or_else(|_| {
					debug!("pipeline: preview of {url} timed out");
					None
				});
		}
	}
}

/// Pretty-printed JSON, written through a temporary sibling.
pub fn write_artifact(doc: &PortfolioDocument, path: &Path) -> Result<(), PipelineError> {
	let json = serde_json::to_string_pretty(doc)?;
	let tmp = path.with_extension("json.tmp");
	fs::write(&tmp, json).map_err(|e| PipelineError::io(&tmp, e))?;
	fs::rename(&tmp, path).map_err(|e| PipelineError::io(path, e))
}
