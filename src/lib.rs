//! roots-portfolio: a radial mind-map portfolio site and its content build.
//!
//! The crate compiles for two targets. On wasm32 it is a Leptos CSR app that
//! loads the baked `portfolio.json`, shows the branches strip and lays the
//! roots mind-map out on a pannable canvas. Natively it carries the
//! [`pipeline`] that pulls content from Notion and writes that artifact.
//! Everything in between (data model, outline parsing, layout, navigation)
//! is shared and tested natively.

pub mod components;
pub mod content;
pub mod loader;
pub mod mindmap;
pub mod navigation;
#[cfg(not(target_arch = "wasm32"))]
pub mod pipeline;

pub use content::{Block, ContentItem, ImageRef, PortfolioDocument};
pub use mindmap::{LayoutConfig, MindmapLayout, MindmapNode, parse_outline};
pub use navigation::{ContentLookup, ModalView, NavigationConfig, resolve_click};

#[cfg(target_arch = "wasm32")]
pub use app::{App, init_logging};

#[cfg(target_arch = "wasm32")]
mod app {
	use leptos::prelude::*;
	use leptos::task::spawn_local;
	use leptos_meta::*;
	use log::{Level, debug, info, warn};

	use crate::components::branches::BranchesStrip;
	use crate::components::mindmap::MindmapCanvas;
	use crate::components::modal::ContentModal;
	use crate::content::PortfolioDocument;
	use crate::loader::load_portfolio;
	use crate::navigation::{ContentLookup, ModalView, NavigationConfig, resolve_click};

	/// Initialize logging and panic hooks for the WASM target.
	pub fn init_logging() {
		let _ = console_log::init_with_level(Level::Debug);
		console_error_panic_hook::set_once();
		info!("roots-portfolio: logging initialized");
	}

	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	enum Page {
		Branches,
		Roots,
	}

	/// Main application component.
	///
	/// The shell renders at once; the artifact arrives asynchronously and
	/// every consumer treats `None` as "not loaded yet".
	#[component]
	pub fn App() -> impl IntoView {
		provide_meta_context();

		let document = RwSignal::new(None::<PortfolioDocument>);
		let modal = RwSignal::new(None::<ModalView>);
		let page = RwSignal::new(Page::Branches);

		spawn_local(async move {
			let doc = load_portfolio().await;
			if !doc.meta.warnings.is_empty() {
				warn!(
					"roots-portfolio: {} mind-map nodes have no content",
					doc.meta.warnings.len()
				);
			}
			document.set(Some(doc));
		});

		let nav = NavigationConfig::default();
		let on_node = Callback::new(move |name: String| {
			let resolved = document.with_untracked(|doc| {
				doc.as_ref()
					.and_then(|doc| resolve_click(&ContentLookup::new(doc), &name, &nav))
			});
			match resolved {
				Some(view) => {
					debug!("roots-portfolio: opening {:?}", view.title());
					modal.set(Some(view));
				}
				None => debug!("roots-portfolio: {name:?} has nothing to open"),
			}
		});
		let on_open = Callback::new(move |view: ModalView| modal.set(Some(view)));

		let display = move |p: Page| move || if page.get() == p { "block" } else { "none" };
		let roots_style = move || {
			format!(
				"position: relative; width: 100%; height: calc(100vh - 4rem); display: {};",
				display(Page::Roots)()
			)
		};

		view! {
			<Html attr:lang="ko" attr:dir="ltr" attr:data-theme="dark" />
			<Title text="Roots Portfolio" />
			<Meta charset="UTF-8" />
			<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

			<nav class="page-tabs">
				<button
					class:active=move || page.get() == Page::Branches
					on:click=move |_| page.set(Page::Branches)
				>
					"Branches"
				</button>
				<button
					class:active=move || page.get() == Page::Roots
					on:click=move |_| page.set(Page::Roots)
				>
					"Roots"
				</button>
			</nav>

			<main>
				<section class="page page-branches" style:display=display(Page::Branches)>
					<BranchesStrip document=document on_open=on_open />
				</section>
				<section class="page page-roots" style=roots_style>
					<MindmapCanvas document=document on_select=on_node />
				</section>
			</main>

			<ContentModal view=modal />
		}
	}
}
