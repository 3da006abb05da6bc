//! Canvas drawing of a mind-map scene.
//!
//! Passes, back to front:
//! 1. Background (screen space)
//! 2. Edges, highlighted ones brighter
//! 3. Nodes outside the highlight, then highlighted nodes on top
//! 4. Labels

use std::collections::HashMap;
use std::f64::consts::PI;

use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::scale::ScaledValues;
use super::scene::{NodeVisual, SceneNode};
use super::state::MindmapState;
use super::theme::{Color, Theme};

fn smooth_step(t: f64) -> f64 {
	t * t * (3.0 - 2.0 * t)
}

/// Preview images, created on first use and drawn once decoded.
#[derive(Default)]
pub struct ImageCache {
	images: HashMap<String, HtmlImageElement>,
}

impl ImageCache {
	/// Start loading every URL not already requested.
	pub fn preload<'a>(&mut self, urls: impl IntoIterator<Item = &'a str>) {
		for url in urls {
			if self.images.contains_key(url) {
				continue;
			}
			if let Ok(img) = HtmlImageElement::new() {
				img.set_src(url);
				self.images.insert(url.to_string(), img);
			}
		}
	}

	/// Images decoded and drawable.
	pub fn ready_count(&self) -> usize {
		self.images.values().filter(|img| img.complete() && img.natural_width() > 0).count()
	}

	/// Whether any requested image has not finished loading yet.
	pub fn loading(&self) -> bool {
		self.images.values().any(|img| !img.complete())
	}

	fn ready(&self, url: &str) -> Option<&HtmlImageElement> {
		self.images
			.get(url)
			.filter(|img| img.complete() && img.natural_width() > 0)
	}
}

/// Draw one frame.
pub fn render(state: &MindmapState, ctx: &CanvasRenderingContext2d, theme: &Theme, images: &ImageCache) {
	let transform = state.viewport.transform();
	let (width, height) = state.viewport.size();
	let scaled = ScaledValues::new(&state.scale, transform.k);

	draw_background(ctx, theme, width, height);

	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);

	draw_edges(state, ctx, theme, &scaled);
	draw_nodes(state, ctx, theme, &scaled, images);

	ctx.restore();
}

fn draw_background(ctx: &CanvasRenderingContext2d, theme: &Theme, width: f64, height: f64) {
	let (cx, cy) = (width / 2.0, height / 2.0);
	match ctx.create_radial_gradient(cx, cy, 0.0, cx, cy, width.max(height) * 0.8) {
		Ok(gradient) => {
			let _ = gradient.add_color_stop(0.0, &theme.background_glow.to_css());
			let _ = gradient.add_color_stop(1.0, &theme.background.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		Err(_) => ctx.set_fill_style_str(&theme.background.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, width, height);
}

/// Opacity multiplier for elements outside the highlight.
fn dimming(max_t: f64) -> f64 {
	1.0 - 0.7 * max_t
}

fn draw_edges(state: &MindmapState, ctx: &CanvasRenderingContext2d, theme: &Theme, scaled: &ScaledValues) {
	let max_t = smooth_step(state.highlight.max_intensity());
	for &(a, b) in &state.scene.edges {
		let (Some(from), Some(to)) = (state.scene.nodes.get(a), state.scene.nodes.get(b)) else {
			continue;
		};
		let edge_t = smooth_step(state.highlight.edge_intensity(a, b));
		let color = if edge_t > 0.01 {
			theme.edge.lerp(theme.edge_highlight, edge_t)
		} else {
			theme.edge.with_alpha(theme.edge.a * dimming(max_t))
		};
		ctx.set_stroke_style_str(&color.to_css());
		ctx.set_line_width(scaled.edge_line_width * (1.0 + edge_t));
		ctx.begin_path();
		ctx.move_to(from.x, from.y);
		ctx.line_to(to.x, to.y);
		ctx.stroke();
	}
}

fn draw_nodes(
	state: &MindmapState,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	scaled: &ScaledValues,
	images: &ImageCache,
) {
	let max_t = smooth_step(state.highlight.max_intensity());
	let dim = dimming(max_t);

	// Pass 1: everything outside the highlight.
	for (idx, node) in state.scene.nodes.iter().enumerate() {
		if state.highlight.node_intensity(idx) > 0.001 {
			continue;
		}
		draw_node(ctx, node, theme, scaled, images, dim, 1.0);
	}

	// Pass 2: highlighted and fading nodes on top.
	for (idx, node) in state.scene.nodes.iter().enumerate() {
		let node_t = smooth_step(state.highlight.node_intensity(idx));
		if node_t <= 0.001 {
			continue;
		}
		let alpha = dim + (1.0 - dim) * node_t;
		let grow = 1.0 + 0.15 * node_t;
		draw_node(ctx, node, theme, scaled, images, alpha, grow);

		let ring_t = smooth_step(state.highlight.ring_intensity(idx));
		if ring_t > 0.01 {
			let radius = node.radius(scaled) * grow + scaled.ring_offset;
			ctx.begin_path();
			let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&theme.ring.with_alpha(0.8 * ring_t).to_css());
			ctx.set_line_width(scaled.ring_width);
			ctx.stroke();
		}
	}
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	node: &SceneNode,
	theme: &Theme,
	scaled: &ScaledValues,
	images: &ImageCache,
	alpha: f64,
	grow: f64,
) {
	let radius = node.radius(scaled) * grow;
	let color = theme.depth_color(node.depth);
	ctx.set_global_alpha(alpha);

	match &node.visual {
		NodeVisual::Preview { image_url } => {
			draw_preview(ctx, node, radius, images.ready(image_url), color);
			ctx.begin_path();
			let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&theme.preview_border.to_css());
			ctx.set_line_width(scaled.edge_line_width * 2.0);
			ctx.stroke();
		}
		NodeVisual::Marker => {
			ctx.begin_path();
			let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(&color.to_css());
			ctx.fill();
		}
	}

	let label_alpha = scaled.label_alpha(node.depth);
	if label_alpha > 0.01 {
		ctx.set_global_alpha(alpha * label_alpha);
		ctx.set_fill_style_str(&theme.label.to_css());
		ctx.set_font(&scaled.label_font);
		ctx.set_text_align("center");
		ctx.set_text_baseline("top");
		let _ = ctx.fill_text(&node.name, node.x, node.y + radius + scaled.label_size * 0.5);
	}
	ctx.set_global_alpha(1.0);
}

/// Circular, centre-cropped image; a tinted disc until the image decodes.
fn draw_preview(
	ctx: &CanvasRenderingContext2d,
	node: &SceneNode,
	radius: f64,
	image: Option<&HtmlImageElement>,
	fallback: Color,
) {
	ctx.save();
	ctx.begin_path();
	let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
	ctx.clip();
	match image {
		Some(img) => {
			let (w, h) = (img.natural_width() as f64, img.natural_height() as f64);
			let side = w.min(h);
			let _ = ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
				img,
				(w - side) / 2.0,
				(h - side) / 2.0,
				side,
				side,
				node.x - radius,
				node.y - radius,
				radius * 2.0,
				radius * 2.0,
			);
		}
		None => {
			ctx.set_fill_style_str(&fallback.with_alpha(0.3).to_css());
			ctx.fill_rect(node.x - radius, node.y - radius, radius * 2.0, radius * 2.0);
		}
	}
	ctx.restore();
}
