//! Radial mind-map canvas.
//!
//! The headless half (scene building, viewport and hover state, zoom-aware
//! sizing, colours) compiles everywhere and is unit tested natively. Drawing
//! and the leptos component only exist on wasm32.
//!
//! ```ignore
//! let doc = RwSignal::new(None::<PortfolioDocument>);
//! view! { <MindmapCanvas document=doc on_select=move |name: String| open(name) /> }
//! ```

#[cfg(target_arch = "wasm32")]
mod component;
#[cfg(target_arch = "wasm32")]
mod render;
pub mod scale;
pub mod scene;
pub mod state;
pub mod theme;

#[cfg(target_arch = "wasm32")]
pub use component::MindmapCanvas;
pub use scene::{NodeVisual, Scene, SceneNode};
pub use state::{FrameGate, FrameStep, HighlightState, MindmapState, ViewTransform, Viewport, ViewportConfig};
pub use theme::Theme;
