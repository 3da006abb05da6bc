//! Bakes the Notion workspace into `data/portfolio.json` and WebP images.
//!
//! Usage:
//!   NOTION_TOKEN=secret_xxx cargo run --bin build-content
//!   cargo run --bin build-content -- --root-page <id> --no-previews
//!
//! Exits non-zero when the token is missing, the source rejects it, images
//! remain unconverted, or the artifact was not written.

#![allow(unused_crate_dependencies)]

#[cfg(not(target_arch = "wasm32"))]
mod cli {
	use std::path::PathBuf;
	use std::sync::Arc;

	use anyhow::{Context, Result};
	use clap::Parser;
	use log::error;

	use roots_portfolio::pipeline::{
		BuildConfig, DEFAULT_ROOT_PAGE, HttpImageFetcher, HttpPreviewFetcher, NoPreviews, NotionClient, Pipeline,
		PreviewFetcher, SourceError,
	};

	/// Build the portfolio content artifact.
	#[derive(Parser, Debug)]
	#[command(name = "build-content")]
	#[command(about = "Pull portfolio content from Notion into portfolio.json")]
	struct Args {
		/// Notion integration token
		#[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
		token: Option<String>,

		/// Page holding the portfolio collections
		#[arg(long, env = "PORTFOLIO_ROOT_PAGE", default_value = DEFAULT_ROOT_PAGE)]
		root_page: String,

		/// Directory for portfolio.json
		#[arg(long, default_value = "data")]
		data_dir: PathBuf,

		/// Directory for downloaded images
		#[arg(long, default_value = "assets/images/portfolio")]
		image_dir: PathBuf,

		/// Simultaneous image downloads
		#[arg(long, default_value_t = 6)]
		concurrency: usize,

		/// Maximum image width after conversion
		#[arg(long, default_value_t = 1920)]
		max_width: u32,

		/// WebP quality (0-100)
		#[arg(long, default_value_t = 80.0)]
		quality: f32,

		/// Skip fetching bookmark preview metadata
		#[arg(long)]
		no_previews: bool,
	}

	impl Args {
		fn config(&self) -> BuildConfig {
			let mut config = BuildConfig {
				root_page: self.root_page.clone(),
				data_dir: self.data_dir.clone(),
				image_dir: self.image_dir.clone(),
				..BuildConfig::default()
			};
			config.download.concurrency = self.concurrency;
			config.convert.max_width = self.max_width;
			config.convert.quality = self.quality.clamp(0.0, 100.0);
			config
		}
	}

	pub async fn run() -> Result<()> {
		let args = Args::parse();
		let config = args.config();

		let Some(token) = args.token.as_deref().filter(|t| !t.trim().is_empty()) else {
			error!("build-content: NOTION_TOKEN not set");
			return Err(SourceError::MissingToken.into());
		};

		let source = NotionClient::new(token, config.page_size).context("creating Notion client")?;
		let images = HttpImageFetcher::new(&config.download).context("creating image client")?;
		let previews: Arc<dyn PreviewFetcher> = if args.no_previews {
			Arc::new(NoPreviews)
		} else {
			Arc::new(HttpPreviewFetcher::new(config.preview_timeout).context("creating preview client")?)
		};

		let pipeline = Pipeline::new(Arc::new(source), Arc::new(images), previews, config);
		match pipeline.run().await {
			Ok(report) => {
				log::info!("build-content: done, {} items", report.items);
				Ok(())
			}
			Err(e) => {
				error!("build-content: build failed: {e}");
				Err(e).context("content build failed")
			}
		}
	}
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	cli::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
