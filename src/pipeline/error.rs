//! Error taxonomy of the build.
//!
//! Only [`PipelineError`] leaves a build run. Source errors are fatal when
//! they mean the credential is bad and skip the collection otherwise;
//! download and convert errors are counted and logged, never propagated.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to the content source.
#[derive(Debug, Error)]
pub enum SourceError {
	#[error("NOTION_TOKEN is not set")]
	MissingToken,
	#[error("content source rejected the token: {0}")]
	Unauthorized(String),
	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("HTTP {status} from {url}: {body}")]
	Status { status: u16, url: String, body: String },
	#[error("malformed response: {0}")]
	Decode(#[from] serde_json::Error),
}

impl SourceError {
	/// Errors that abort the whole build instead of one collection.
	pub fn is_fatal(&self) -> bool {
		matches!(self, SourceError::MissingToken | SourceError::Unauthorized(_))
	}
}

/// One failed download attempt.
#[derive(Debug, Error)]
pub enum DownloadError {
	#[error("HTTP {0}")]
	Status(u16),
	#[error("body too small ({0} bytes)")]
	TooSmall(u64),
	#[error("more than {0} redirects")]
	TooManyRedirects(u32),
	#[error("transport: {0}")]
	Transport(String),
	#[error(transparent)]
	Io(#[from] io::Error),
}

/// Failure converting one image.
#[derive(Debug, Error)]
pub enum ConvertError {
	#[error("decode: {0}")]
	Decode(#[from] image::ImageError),
	#[error("encoder produced no output")]
	Encode,
	#[error(transparent)]
	Io(#[from] io::Error),
}

/// Why a build run failed.
#[derive(Debug, Error)]
pub enum PipelineError {
	#[error(transparent)]
	Source(#[from] SourceError),
	#[error("{path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("serializing artifact: {0}")]
	Serialize(#[from] serde_json::Error),
	#[error("{} images left unconverted: {}", .0.len(), .0.join(", "))]
	Stragglers(Vec<String>),
	#[error("artifact was not written: {0}")]
	MissingArtifact(PathBuf),
}

impl PipelineError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
		PipelineError::Io {
			path: path.into(),
			source,
		}
	}
}
