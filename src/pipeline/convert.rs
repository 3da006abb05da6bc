//! Post-pass image normalization to WebP.
//!
//! Runs after all downloads, over the whole image directory:
//! 1. convert every png/jpg/jpeg without a usable `.webp` sibling
//! 2. delete originals whose `.webp` is confirmed
//! 3. retry leftovers, at most `max_passes` times
//!
//! A `.webp` is confirmed when this run wrote it, or when it is larger than
//! `existing_threshold`. Anything smaller is treated as a broken leftover and
//! never justifies deleting its original.
//!
//! Whatever raster originals remain are stragglers; the build fails on them.
//! GIFs are never touched.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use log::{info, warn};

use super::config::ConvertConfig;
use super::error::{ConvertError, PipelineError};
use crate::content::{CONVERTED_EXTENSION, is_convertible_raster};

/// What the post-pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConvertSummary {
	pub converted: usize,
	/// Originals whose WebP was already confirmed.
	pub skipped: usize,
	pub failed: usize,
	/// Originals removed after their WebP was confirmed.
	pub deleted: usize,
	pub delete_failed: usize,
	/// Verification passes that found leftovers.
	pub passes: u32,
	/// GIFs in the directory, left unconverted to keep their animation.
	pub gifs: usize,
	/// WebP files in the directory after the run.
	pub webp: usize,
	/// Raster originals still present at the end, by file name.
	pub stragglers: Vec<String>,
}

/// Decode `input`, downscale to `max_width` if wider, encode WebP to `output`.
///
/// The result is written to a temporary sibling and renamed into place, so
/// `output` never holds a partial file.
pub fn convert_one(input: &Path, output: &Path, config: &ConvertConfig) -> Result<(), ConvertError> {
	let mut img = image::open(input)?;
	if img.width() > config.max_width {
		img = img.resize(config.max_width, u32::MAX, FilterType::Lanczos3);
	}
	let rgba = img.to_rgba8();
	let encoded = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height()).encode(config.quality);
	if encoded.is_empty() {
		return Err(ConvertError::Encode);
	}
	let tmp = output.with_extension(format!("{CONVERTED_EXTENSION}.tmp"));
	fs::write(&tmp, &*encoded)?;
	fs::rename(&tmp, output)?;
	Ok(())
}

fn webp_sibling(path: &Path) -> PathBuf {
	path.with_extension(CONVERTED_EXTENSION)
}

fn size_of(path: &Path) -> Option<u64> {
	fs::metadata(path).ok().map(|m| m.len())
}

/// Sorted raster originals in `dir`.
fn originals(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
	let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
	let mut files: Vec<PathBuf> = entries
		.filter_map(Result::ok)
		.map(|e| e.path())
		.filter(|p| p.is_file() && p.to_str().is_some_and(is_convertible_raster))
		.collect();
	files.sort();
	Ok(files)
}

fn count_extension(dir: &Path, ext: &str) -> usize {
	fs::read_dir(dir)
		.map(|entries| {
			entries
				.filter_map(Result::ok)
				.filter(|e| {
					e.path()
						.extension()
						.and_then(|x| x.to_str())
						.is_some_and(|x| x.eq_ignore_ascii_case(ext))
				})
				.count()
		})
		.unwrap_or(0)
}

fn file_name(path: &Path) -> String {
	path.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.unwrap_or_default()
}

/// Outputs written during one run.
struct Written<'a> {
	config: &'a ConvertConfig,
	paths: HashSet<PathBuf>,
}

impl Written<'_> {
	fn confirmed(&self, output: &Path) -> bool {
		self.paths.contains(output) || size_of(output).is_some_and(|s| s > self.config.existing_threshold)
	}
}

/// Run every phase over `dir`.
pub fn normalize_images(dir: &Path, config: &ConvertConfig) -> Result<ConvertSummary, PipelineError> {
	let mut summary = ConvertSummary::default();
	let mut written = Written {
		config,
		paths: HashSet::new(),
	};

	let first = originals(dir)?;
	info!(
		"convert: {} images to convert ({} GIFs left as-is)",
		first.len(),
		count_extension(dir, "gif")
	);
	for input in &first {
		let output = webp_sibling(input);
		if size_of(&output).is_some_and(|s| s > config.existing_threshold) {
			summary.skipped += 1;
			continue;
		}
		match convert_one(input, &output, config) {
			Ok(()) => {
				info!("convert: {} -> {}", file_name(input), file_name(&output));
				summary.converted += 1;
				written.paths.insert(output);
			}
			Err(e) => {
				warn!("convert: {} failed: {e}", file_name(input));
				summary.failed += 1;
			}
		}
	}

	for input in originals(dir)? {
		if !written.confirmed(&webp_sibling(&input)) {
			continue;
		}
		match fs::remove_file(&input) {
			Ok(()) => summary.deleted += 1,
			Err(e) => {
				warn!("convert: could not delete {}: {e}", file_name(&input));
				summary.delete_failed += 1;
			}
		}
	}

	while summary.passes < config.max_passes {
		let left = originals(dir)?;
		if left.is_empty() {
			break;
		}
		summary.passes += 1;
		info!("convert: pass {} over {} leftovers", summary.passes, left.len());
		for input in left {
			let output = webp_sibling(&input);
			if !written.confirmed(&output) {
				if let Err(e) = convert_one(&input, &output, config) {
					warn!("convert: {} failed again: {e}", file_name(&input));
					continue;
				}
				summary.converted += 1;
				written.paths.insert(output);
			}
			match fs::remove_file(&input) {
				Ok(()) => summary.deleted += 1,
				Err(e) => warn!("convert: could not delete {}: {e}", file_name(&input)),
			}
		}
	}

	summary.stragglers = originals(dir)?.iter().map(|p| file_name(p)).collect();
	summary.gifs = count_extension(dir, "gif");
	summary.webp = count_extension(dir, CONVERTED_EXTENSION);
	Ok(summary)
}
