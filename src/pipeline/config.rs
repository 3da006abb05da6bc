//! Build tunables.

use std::path::PathBuf;
use std::time::Duration;

use crate::content::PORTFOLIO_IMAGE_PREFIX;

/// Notion page whose children hold the portfolio collections.
pub const DEFAULT_ROOT_PAGE: &str = "2d41f3d0ca3580a4883cdcbeceb7ad98";

/// Everything one build run needs besides credentials.
#[derive(Clone, Debug)]
pub struct BuildConfig {
	/// Page whose child databases are the content collections.
	pub root_page: String,
	/// Directory the artifact is written to.
	pub data_dir: PathBuf,
	pub artifact_name: String,
	/// Where downloaded and converted images live on disk.
	pub image_dir: PathBuf,
	/// Prefix of image paths written into the artifact.
	pub public_image_prefix: String,
	/// Language tag of the code block carrying the mind-map outline.
	pub structure_language: String,
	/// Results requested per source query page.
	pub page_size: u32,
	/// Budget for one bookmark preview fetch.
	pub preview_timeout: Duration,
	pub download: DownloadConfig,
	pub convert: ConvertConfig,
}

impl Default for BuildConfig {
	fn default() -> Self {
		Self {
			root_page: DEFAULT_ROOT_PAGE.to_string(),
			data_dir: PathBuf::from("data"),
			artifact_name: "portfolio.json".to_string(),
			image_dir: PathBuf::from(PORTFOLIO_IMAGE_PREFIX),
			public_image_prefix: PORTFOLIO_IMAGE_PREFIX.to_string(),
			structure_language: "php".to_string(),
			page_size: 100,
			preview_timeout: Duration::from_secs(5),
			download: DownloadConfig::default(),
			convert: ConvertConfig::default(),
		}
	}
}

impl BuildConfig {
	pub fn artifact_path(&self) -> PathBuf {
		self.data_dir.join(&self.artifact_name)
	}
}

/// Image download limits.
#[derive(Clone, Debug)]
pub struct DownloadConfig {
	/// Simultaneous downloads.
	pub concurrency: usize,
	/// Tries per image, including the first.
	pub attempts: u32,
	/// Fixed wait between tries.
	pub backoff: Duration,
	/// Per request.
	pub timeout: Duration,
	pub max_redirects: u32,
	/// Bodies smaller than this are treated as failed downloads.
	pub min_valid_bytes: u64,
	/// Files already on disk above this size are reused.
	pub existing_threshold: u64,
}

impl Default for DownloadConfig {
	fn default() -> Self {
		Self {
			concurrency: 6,
			attempts: 3,
			backoff: Duration::from_secs(2),
			timeout: Duration::from_secs(60),
			max_redirects: 5,
			min_valid_bytes: 100,
			existing_threshold: 1000,
		}
	}
}

/// WebP post-pass settings.
#[derive(Clone, Debug)]
pub struct ConvertConfig {
	/// Wider images are downscaled to this width. Never upscaled.
	pub max_width: u32,
	/// Lossy encoder quality, 0 to 100.
	pub quality: f32,
	/// Cap on verification passes over leftover originals.
	pub max_passes: u32,
	/// Converted files above this size count as done.
	pub existing_threshold: u64,
}

impl Default for ConvertConfig {
	fn default() -> Self {
		Self {
			max_width: 1920,
			quality: 80.0,
			max_passes: 10,
			existing_threshold: 1000,
		}
	}
}
