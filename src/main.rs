//! Client entrypoint for the CSR build.
//!
//! The site only runs in the browser; the native build of this binary just
//! points at the content pipeline.

#![allow(unused_crate_dependencies)]

#[cfg(target_arch = "wasm32")]
fn main() {
	use leptos::prelude::*;
	use roots_portfolio::{App, init_logging};

	init_logging();

	mount_to_body(|| {
		view! { <App /> }
	})
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
	eprintln!("roots-portfolio is a wasm32 client; build it with trunk. Run `build-content` to bake the content artifact.");
}
