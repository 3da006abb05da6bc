//! UI components.

#[cfg(target_arch = "wasm32")]
pub mod branches;
pub mod mindmap;
#[cfg(target_arch = "wasm32")]
pub mod modal;
