//! Build runs against an in-memory workspace and image host.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use roots_portfolio::content::LinkMeta;
use roots_portfolio::{Block, PortfolioDocument};
use roots_portfolio::pipeline::extract::ImageTask;
use roots_portfolio::pipeline::{
	BuildConfig, ContentSource, DownloadConfig, DownloadError, Downloader, Fetched, ImageFetcher, NoPreviews, Page,
	Pipeline, PipelineError, PreviewFetcher, RawBlock, RawRecord, SourceError,
};

const ROOT: &str = "root-page";

const OUTLINE: &str = "중심\n제목: 나의 신념\n1차 연결점\n제목: Studio Works\n1차 연결점\n제목: Ghost Node";

fn paragraph(id: &str, text: &str) -> RawBlock {
	RawBlock::new(id, "paragraph", json!({"rich_text": [{"plain_text": text, "href": null}]}))
}

fn collection(id: &str, title: &str) -> RawBlock {
	RawBlock::new(id, "child_database", json!({ "title": title }))
}

fn record(id: &str, title: &str) -> RawRecord {
	let props = json!({"Name": {"title": [{"plain_text": title, "href": null}]}});
	RawRecord {
		id: id.into(),
		properties: props.as_object().cloned().unwrap(),
	}
}

/// Pages, blocks and collection rows held in memory.
#[derive(Default)]
struct Workspace {
	children: HashMap<String, Vec<RawBlock>>,
	rows: HashMap<String, Vec<RawRecord>>,
	/// Collection id to HTTP status it fails with.
	failing: HashMap<String, u16>,
}

impl Workspace {
	fn sample() -> Self {
		let mut ws = Workspace::default();
		ws.children.insert(
			ROOT.into(),
			vec![
				RawBlock::new(
					"outline",
					"code",
					json!({"language": "php", "rich_text": [{"plain_text": OUTLINE, "href": null}]}),
				),
				collection("db-branches", "가지"),
				collection("db-beliefs", "나의 신념"),
				collection("db-video", "영상 상세 포트폴리오"),
				collection("db-more-branches", "Branches (archive)"),
			],
		);
		ws.rows.insert(
			"db-branches".into(),
			vec![record("rec-studio", "Studio Works"), record("rec-poster", "Poster")],
		);
		ws.rows.insert("db-beliefs".into(), vec![record("rec-belief", "나의 신념")]);
		ws.rows.insert("db-video".into(), vec![record("rec-teaser", "Teaser")]);
		ws.rows.insert("db-more-branches".into(), vec![record("rec-old", "Old Site")]);

		ws.children.insert(
			"rec-studio".into(),
			vec![
				paragraph("s1", "Logo and type."),
				RawBlock::new(
					"s2",
					"image",
					json!({"type": "external", "external": {"url": "https://cdn.example/studio.gif"}}),
				),
			],
		);
		ws.children.insert("rec-poster".into(), vec![paragraph("p1", "Print run.")]);
		ws.children.insert("rec-belief".into(), vec![paragraph("b1", "Grow slowly.")]);
		ws
	}

	fn fail(mut self, collection_id: &str, status: u16) -> Self {
		self.failing.insert(collection_id.into(), status);
		self
	}
}

#[async_trait]
impl ContentSource for Workspace {
	async fn list_children(&self, block_id: &str, _cursor: Option<&str>) -> Result<Page<RawBlock>, SourceError> {
		Ok(Page {
			results: self.children.get(block_id).cloned().unwrap_or_default(),
			has_more: false,
			next_cursor: None,
		})
	}

	async fn query_collection(&self, collection_id: &str, _cursor: Option<&str>) -> Result<Page<RawRecord>, SourceError> {
		match self.failing.get(collection_id) {
			Some(401) => Err(SourceError::Unauthorized("invalid token".into())),
			Some(&status) => Err(SourceError::Status {
				status,
				url: collection_id.into(),
				body: String::new(),
			}),
			None => Ok(Page {
				results: self.rows.get(collection_id).cloned().unwrap_or_default(),
				has_more: false,
				next_cursor: None,
			}),
		}
	}
}

/// Writes a 2 KiB body for every URL except those containing `missing`.
#[derive(Default)]
struct Host {
	requests: AtomicUsize,
}

#[async_trait]
impl ImageFetcher for Host {
	async fn fetch(&self, url: &str, dest: &Path) -> Result<Fetched, DownloadError> {
		self.requests.fetch_add(1, Ordering::SeqCst);
		if url.contains("missing") {
			return Err(DownloadError::Status(404));
		}
		tokio::fs::write(dest, vec![7u8; 2048]).await?;
		Ok(Fetched::Written(2048))
	}
}

fn config(base: &Path) -> BuildConfig {
	BuildConfig {
		root_page: ROOT.into(),
		data_dir: base.join("data"),
		image_dir: base.join("images"),
		download: DownloadConfig {
			backoff: Duration::ZERO,
			..DownloadConfig::default()
		},
		..BuildConfig::default()
	}
}

fn pipeline(source: Workspace, host: Arc<Host>, base: &Path) -> Pipeline {
	Pipeline::new(Arc::new(source), host, Arc::new(NoPreviews), config(base))
}

fn titles(items: &[roots_portfolio::ContentItem]) -> Vec<&str> {
	items.iter().map(|i| i.title.as_str()).collect()
}

#[tokio::test]
async fn collections_land_in_their_buckets() {
	let dir = tempfile::tempdir().unwrap();
	let host = Arc::new(Host::default());
	let report = pipeline(Workspace::sample(), host.clone(), dir.path())
		.run()
		.await
		.unwrap();

	assert_eq!(report.collections, 4);
	assert_eq!(report.items, 5);
	assert_eq!(report.downloads.downloaded, 1);

	let json = std::fs::read_to_string(dir.path().join("data/portfolio.json")).unwrap();
	let doc: PortfolioDocument = serde_json::from_str(&json).unwrap();
	// Two branch collections append in source order.
	assert_eq!(titles(&doc.branches), ["Studio Works", "Poster", "Old Site"]);
	assert_eq!(titles(&doc.beliefs), ["나의 신념"]);
	assert_eq!(titles(&doc.detailed_portfolios["영상 상세 포트폴리오"]), ["Teaser"]);
	assert_eq!(doc.roots_structure.as_deref(), Some(OUTLINE));

	let studio = &doc.branches[0];
	assert_eq!(studio.content, ["Logo and type."]);
	assert_eq!(studio.description, "Logo and type.");
	assert!(studio.image_url.starts_with("assets/images/portfolio/"));
	assert!(studio.image_url.ends_with(".gif"));
	assert_eq!(studio.images.len(), 1);
}

#[tokio::test]
async fn unmatched_nodes_are_recorded_as_warnings() {
	let dir = tempfile::tempdir().unwrap();
	let (doc, report) = pipeline(Workspace::sample(), Arc::default(), dir.path())
		.collect()
		.await
		.unwrap();

	let unmatched: Vec<(&str, usize)> = doc.meta.warnings.iter().map(|w| (w.node.as_str(), w.depth)).collect();
	assert_eq!(unmatched, [("Ghost Node", 1)]);
	assert_eq!(report.warnings, doc.meta.warnings);
}

#[tokio::test]
async fn failing_collection_is_skipped() {
	let dir = tempfile::tempdir().unwrap();
	let source = Workspace::sample().fail("db-video", 500);
	let report = pipeline(source, Arc::default(), dir.path()).run().await.unwrap();

	assert_eq!(report.collections, 3);
	assert_eq!(report.skipped_collections, 1);
	let json = std::fs::read_to_string(report.artifact).unwrap();
	let doc: PortfolioDocument = serde_json::from_str(&json).unwrap();
	assert!(doc.detailed_portfolios.is_empty());
}

#[tokio::test]
async fn rejected_token_aborts_the_build() {
	let dir = tempfile::tempdir().unwrap();
	let source = Workspace::sample().fail("db-beliefs", 401);
	let err = pipeline(source, Arc::default(), dir.path()).run().await.unwrap_err();

	assert!(matches!(err, PipelineError::Source(SourceError::Unauthorized(_))));
	assert!(!dir.path().join("data/portfolio.json").exists());
}

#[tokio::test]
async fn repeated_builds_agree() {
	let first = tempfile::tempdir().unwrap();
	let second = tempfile::tempdir().unwrap();
	let (a, _) = pipeline(Workspace::sample(), Arc::default(), first.path())
		.collect()
		.await
		.unwrap();
	let (b, _) = pipeline(Workspace::sample(), Arc::default(), second.path())
		.collect()
		.await
		.unwrap();
	assert_eq!(a, b);
}

#[tokio::test]
async fn second_run_downloads_nothing() {
	let dir = tempfile::tempdir().unwrap();
	let host = Arc::new(Host::default());

	pipeline(Workspace::sample(), host.clone(), dir.path()).run().await.unwrap();
	let after_first = host.requests.load(Ordering::SeqCst);
	assert_eq!(after_first, 1);

	let report = pipeline(Workspace::sample(), host.clone(), dir.path())
		.run()
		.await
		.unwrap();
	assert_eq!(host.requests.load(Ordering::SeqCst), after_first);
	assert_eq!(report.downloads.skipped, 1);
	assert_eq!(report.downloads.downloaded, 0);
}

#[tokio::test]
async fn missing_image_fails_after_every_attempt() {
	let dir = tempfile::tempdir().unwrap();
	let host = Arc::new(Host::default());
	let config = DownloadConfig {
		backoff: Duration::ZERO,
		..DownloadConfig::default()
	};
	let downloader = Downloader::new(host.clone(), config, dir.path(), "assets/");

	let task = ImageTask {
		url: "https://cdn.example/missing.png".into(),
		filename: "page_block.png".into(),
	};
	assert_eq!(downloader.download(&task).await, None);
	assert_eq!(host.requests.load(Ordering::SeqCst), 3);

	let summary = downloader.summary();
	assert_eq!((summary.found, summary.failed, summary.downloaded), (1, 1, 0));
	assert!(!dir.path().join("page_block.png").exists());
}

/// Answers every preview request after `delay`, counting calls.
struct Previews {
	delay: Duration,
	calls: AtomicUsize,
}

#[async_trait]
impl PreviewFetcher for Previews {
	async fn fetch(&self, url: &str) -> Option<LinkMeta> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		tokio::time::sleep(self.delay).await;
		Some(LinkMeta {
			title: Some(format!("title of {url}")),
			..LinkMeta::default()
		})
	}
}

fn with_bookmarks() -> Workspace {
	let mut ws = Workspace::sample();
	ws.children.insert(
		"rec-poster".into(),
		vec![
			RawBlock::new("k1", "bookmark", json!({"url": "https://blog.example/post"})),
			RawBlock::new("k2", "bookmark", json!({"url": "https://youtu.be/dQw4w9WgXcQ"})),
		],
	);
	ws
}

fn bookmark_meta(doc: &PortfolioDocument) -> Vec<Option<LinkMeta>> {
	doc.branches[1]
		.rich_content
		.iter()
		.filter_map(|block| match block {
			Block::Bookmark { meta, .. } => Some(meta.clone()),
			_ => None,
		})
		.collect()
}

#[tokio::test]
async fn bookmarks_get_previews_except_youtube() {
	let dir = tempfile::tempdir().unwrap();
	let previews = Arc::new(Previews {
		delay: Duration::ZERO,
		calls: AtomicUsize::new(0),
	});
	let pipeline = Pipeline::new(
		Arc::new(with_bookmarks()),
		Arc::new(Host::default()),
		previews.clone(),
		config(dir.path()),
	);
	let (doc, _) = pipeline.collect().await.unwrap();

	assert_eq!(previews.calls.load(Ordering::SeqCst), 1);
	let meta = bookmark_meta(&doc);
	assert_eq!(meta.len(), 2);
	assert_eq!(
		meta[0].as_ref().and_then(|m| m.title.as_deref()),
		Some("title of https://blog.example/post")
	);
	assert_eq!(meta[1], None);
}

#[tokio::test]
async fn slow_previews_degrade_to_bare_links() {
	let dir = tempfile::tempdir().unwrap();
	let previews = Arc::new(Previews {
		delay: Duration::from_secs(5),
		calls: AtomicUsize::new(0),
	});
	let config = BuildConfig {
		preview_timeout: Duration::from_millis(20),
		..config(dir.path())
	};
	let pipeline = Pipeline::new(Arc::new(with_bookmarks()), Arc::new(Host::default()), previews, config);
	let (doc, _) = pipeline.collect().await.unwrap();

	assert_eq!(bookmark_meta(&doc), [None, None]);
}
