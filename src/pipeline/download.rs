//! Bounded-concurrency image acquisition.
//!
//! Every image goes through one [`Downloader`]. A semaphore caps in-flight
//! downloads; each image is retried with a fixed backoff and counted once,
//! by outcome, in [`DownloadStats`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use futures::future::join_all;
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;

use super::config::DownloadConfig;
use super::error::DownloadError;
use super::extract::ImageTask;
use crate::content::{is_convertible_raster, to_converted_path};

/// Result of one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetched {
	/// Body written to the destination, `n` bytes.
	Written(u64),
	/// Redirect to another location.
	Redirect(String),
}

/// Single HTTP GET streamed to a file.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
	/// Non-success statuses other than redirects are `DownloadError::Status`.
	async fn fetch(&self, url: &str, dest: &Path) -> Result<Fetched, DownloadError>;
}

/// reqwest-backed fetcher. Redirects are surfaced, not followed.
pub struct HttpImageFetcher {
	http: reqwest::Client,
}

impl HttpImageFetcher {
	pub fn new(config: &DownloadConfig) -> Result<Self, reqwest::Error> {
		Ok(Self {
			http: reqwest::Client::builder()
				.timeout(config.timeout)
				.redirect(reqwest::redirect::Policy::none())
				.build()?,
		})
	}
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
	async fn fetch(&self, url: &str, dest: &Path) -> Result<Fetched, DownloadError> {
		let transport = |e: reqwest::Error| DownloadError::Transport(e.to_string());
		let response = self.http.get(url).send().await.map_err(transport)?;
		let status = response.status();
		if status.is_redirection() {
			let location = response
				.headers()
				.get(reqwest::header::LOCATION)
				.and_then(|v| v.to_str().ok())
				.ok_or(DownloadError::Status(status.as_u16()))?;
			let next = response
				.url()
				.join(location)
				.map_err(|e| DownloadError::Transport(e.to_string()))?;
			return Ok(Fetched::Redirect(next.to_string()));
		}
		if status != reqwest::StatusCode::OK {
			return Err(DownloadError::Status(status.as_u16()));
		}

		let mut file = tokio::fs::File::create(dest).await?;
		let mut written = 0u64;
		let mut body = response.bytes_stream();
		while let Some(chunk) = body.next().await {
			let chunk = chunk.map_err(transport)?;
			file.write_all(&chunk).await?;
			written += chunk.len() as u64;
		}
		file.flush().await?;
		Ok(Fetched::Written(written))
	}
}

/// Outcome counters. `found` counts images seen, the other three partition them.
#[derive(Debug, Default)]
pub struct DownloadStats {
	found: AtomicUsize,
	downloaded: AtomicUsize,
	skipped: AtomicUsize,
	failed: AtomicUsize,
}

/// Snapshot of [`DownloadStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DownloadSummary {
	/// Images seen. The other three counters partition it.
	pub found: usize,
	pub downloaded: usize,
	/// Already on disk and large enough to reuse.
	pub skipped: usize,
	pub failed: usize,
}

impl DownloadStats {
	pub fn summary(&self) -> DownloadSummary {
		DownloadSummary {
			found: self.found.load(Ordering::Relaxed),
			downloaded: self.downloaded.load(Ordering::Relaxed),
			skipped: self.skipped.load(Ordering::Relaxed),
			failed: self.failed.load(Ordering::Relaxed),
		}
	}
}

/// Fetches image tasks into the image directory under a concurrency cap.
pub struct Downloader {
	fetcher: Arc<dyn ImageFetcher>,
	config: DownloadConfig,
	dir: PathBuf,
	public_prefix: String,
	permits: Semaphore,
	stats: DownloadStats,
}

impl Downloader {
	pub fn new(
		fetcher: Arc<dyn ImageFetcher>,
		config: DownloadConfig,
		dir: impl Into<PathBuf>,
		public_prefix: impl Into<String>,
	) -> Self {
		let permits = Semaphore::new(config.concurrency.max(1));
		Self {
			fetcher,
			config,
			dir: dir.into(),
			public_prefix: public_prefix.into(),
			permits,
			stats: DownloadStats::default(),
		}
	}

	pub fn summary(&self) -> DownloadSummary {
		self.stats.summary()
	}

	/// Download every task concurrently, keeping successful paths in task order.
	pub async fn download_all(&self, tasks: &[ImageTask]) -> Vec<String> {
		join_all(tasks.iter().map(|task| self.download(task)))
			.await
			.into_iter()
			.flatten()
			.collect()
	}

	/// Artifact path of the image, or `None` once every attempt failed.
	pub async fn download(&self, task: &ImageTask) -> Option<String> {
		self.stats.found.fetch_add(1, Ordering::Relaxed);
		let public = self.public_path(&task.filename);

		if let Some(existing) = self.existing(&task.filename).await {
			debug!("download: {} already present as {existing}", task.filename);
			self.stats.skipped.fetch_add(1, Ordering::Relaxed);
			return Some(public);
		}

		let Ok(_permit) = self.permits.acquire().await else {
			self.stats.failed.fetch_add(1, Ordering::Relaxed);
			return None;
		};
		let dest = self.dir.join(&task.filename);
		let attempts = self.config.attempts.max(1);
		for attempt in 1..=attempts {
			match self.attempt(&task.url, &dest).await {
				Ok(bytes) => {
					info!("download: {} ({bytes} bytes)", task.filename);
					self.stats.downloaded.fetch_add(1, Ordering::Relaxed);
					return Some(public);
				}
				Err(e) => {
					warn!("download: {} attempt {attempt}/{attempts} failed: {e}", task.filename);
					let _ = tokio::fs::remove_file(&dest).await;
					if attempt < attempts {
						tokio::time::sleep(self.config.backoff).await;
					}
				}
			}
		}
		self.stats.failed.fetch_add(1, Ordering::Relaxed);
		None
	}

	/// One attempt including redirect hops.
	async fn attempt(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
		let mut url = url.to_string();
		for _ in 0..=self.config.max_redirects {
			match self.fetcher.fetch(&url, dest).await? {
				Fetched::Redirect(next) => url = next,
				Fetched::Written(bytes) if bytes < self.config.min_valid_bytes => {
					return Err(DownloadError::TooSmall(bytes));
				}
				Fetched::Written(bytes) => return Ok(bytes),
			}
		}
		Err(DownloadError::TooManyRedirects(self.config.max_redirects))
	}

	/// Converted output first, then the original, each above the size threshold.
	async fn existing(&self, filename: &str) -> Option<String> {
		let mut candidates = Vec::with_capacity(2);
		if is_convertible_raster(filename) {
			candidates.push(to_converted_path(filename));
		}
		candidates.push(filename.to_string());
		for name in candidates {
			let size = tokio::fs::metadata(self.dir.join(&name)).await.map(|m| m.len());
			if size.is_ok_and(|s| s > self.config.existing_threshold) {
				return Some(name);
			}
		}
		None
	}

	/// Convertible rasters are published under their converted name.
	fn public_path(&self, filename: &str) -> String {
		let name = if is_convertible_raster(filename) {
			to_converted_path(filename)
		} else {
			filename.to_string()
		};
		format!("{}{name}", self.public_prefix)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;
	use std::time::Duration;

	use super::*;

	/// Serves canned responses per URL, counting requests and peak concurrency.
	#[derive(Default)]
	struct Canned {
		routes: HashMap<String, Result<Fetched, u16>>,
		requests: AtomicUsize,
		in_flight: AtomicUsize,
		peak: AtomicUsize,
	}

	#[async_trait]
	impl ImageFetcher for Canned {
		async fn fetch(&self, url: &str, dest: &Path) -> Result<Fetched, DownloadError> {
			self.requests.fetch_add(1, Ordering::SeqCst);
			let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
			self.peak.fetch_max(now, Ordering::SeqCst);
			tokio::time::sleep(Duration::from_millis(5)).await;
			self.in_flight.fetch_sub(1, Ordering::SeqCst);
			match self.routes.get(url).cloned().unwrap_or(Err(404)) {
				Ok(Fetched::Written(n)) => {
					tokio::fs::write(dest, vec![0u8; n as usize]).await?;
					Ok(Fetched::Written(n))
				}
				Ok(other) => Ok(other),
				Err(status) => Err(DownloadError::Status(status)),
			}
		}
	}

	fn config() -> DownloadConfig {
		DownloadConfig {
			concurrency: 2,
			backoff: Duration::ZERO,
			..DownloadConfig::default()
		}
	}

	fn task(url: &str, filename: &str) -> ImageTask {
		ImageTask {
			url: url.into(),
			filename: filename.into(),
		}
	}

	#[tokio::test]
	async fn follows_redirects_and_publishes_converted_name() {
		let dir = tempfile::tempdir().unwrap();
		let mut canned = Canned::default();
		canned.routes.insert("https://a".into(), Ok(Fetched::Redirect("https://b".into())));
		canned.routes.insert("https://b".into(), Ok(Fetched::Written(2048)));
		let downloader = Downloader::new(Arc::new(canned), config(), dir.path(), "assets/");

		let path = downloader.download(&task("https://a", "p_1.png")).await;
		assert_eq!(path.as_deref(), Some("assets/p_1.webp"));
		assert!(dir.path().join("p_1.png").exists());
		assert_eq!(downloader.summary().downloaded, 1);
	}

	#[tokio::test]
	async fn redirect_loops_give_up() {
		let dir = tempfile::tempdir().unwrap();
		let mut canned = Canned::default();
		canned.routes.insert("https://loop".into(), Ok(Fetched::Redirect("https://loop".into())));
		let canned = Arc::new(canned);
		let downloader = Downloader::new(canned.clone(), config(), dir.path(), "");

		assert_eq!(downloader.download(&task("https://loop", "x.gif")).await, None);
		// 6 requests per attempt (initial + 5 hops), 3 attempts.
		assert_eq!(canned.requests.load(Ordering::SeqCst), 18);
		assert_eq!(downloader.summary().failed, 1);
	}

	#[tokio::test]
	async fn tiny_bodies_are_failures_and_removed() {
		let dir = tempfile::tempdir().unwrap();
		let mut canned = Canned::default();
		canned.routes.insert("https://tiny".into(), Ok(Fetched::Written(10)));
		let downloader = Downloader::new(Arc::new(canned), config(), dir.path(), "");

		assert_eq!(downloader.download(&task("https://tiny", "t.jpg")).await, None);
		assert!(!dir.path().join("t.jpg").exists());
	}

	#[tokio::test]
	async fn concurrency_is_capped() {
		let dir = tempfile::tempdir().unwrap();
		let mut canned = Canned::default();
		let tasks: Vec<ImageTask> = (0..8)
			.map(|i| {
				let url = format!("https://img/{i}");
				canned.routes.insert(url.clone(), Ok(Fetched::Written(500)));
				task(&url, &format!("i{i}.gif"))
			})
			.collect();
		let canned = Arc::new(canned);
		let downloader = Downloader::new(canned.clone(), config(), dir.path(), "p/");

		let paths = downloader.download_all(&tasks).await;
		assert_eq!(paths.len(), 8);
		assert_eq!(paths[3], "p/i3.gif");
		assert!(canned.peak.load(Ordering::SeqCst) <= 2);
		assert_eq!(downloader.summary().found, 8);
	}
}
