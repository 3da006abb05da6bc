//! Leptos component hosting the mind-map canvas.
//!
//! The component owns one [`MindmapState`] for its lifetime. A
//! `requestAnimationFrame` loop advances camera transitions and highlight
//! fades and redraws. It runs only while something moves, input or data has
//! invalidated the canvas, or images are still loading, and only while the
//! canvas is on screen: an `IntersectionObserver` stops it when the page is
//! hidden and restarts it (fitting the view, or flying home on first load)
//! when it comes back.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, IntersectionObserver, IntersectionObserverEntry, MouseEvent,
	TouchEvent, TouchList, WheelEvent,
};

use super::render::{self, ImageCache};
use super::scene::Scene;
use super::state::{FrameGate, MindmapState, ViewportConfig};
use super::theme::Theme;
use crate::content::PortfolioDocument;
use crate::mindmap::{LayoutConfig, MindmapLayout, resolve_tree};
use crate::navigation::{ContentLookup, NavigationConfig};

/// A node press that may turn into a click.
#[derive(Clone, Copy)]
struct Press {
	node: usize,
	x: f64,
	y: f64,
	moved: bool,
}

struct CanvasContext {
	state: MindmapState,
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	theme: Theme,
	images: ImageCache,
	visible: bool,
	frame_pending: bool,
	last_time: Option<f64>,
	gate: FrameGate,
	/// Fly to the home node on the next activation.
	home_pending: bool,
	press: Option<Press>,
}

impl CanvasContext {
	fn local_point(&self, client_x: i32, client_y: i32) -> (f64, f64) {
		let rect = self.canvas.get_bounding_client_rect();
		(client_x as f64 - rect.left(), client_y as f64 - rect.top())
	}

	/// Match the canvas to its container. Hidden containers report zero and are ignored.
	fn sync_size(&mut self) {
		let Some(parent) = self.canvas.parent_element() else {
			return;
		};
		let (w, h) = (parent.client_width() as f64, parent.client_height() as f64);
		if w <= 0.0 || h <= 0.0 {
			return;
		}
		self.canvas.set_width(w as u32);
		self.canvas.set_height(h as u32);
		self.state.viewport.resize(w, h);
		self.gate.invalidate();
	}

	fn apply_document(&mut self, doc: Option<&PortfolioDocument>, nav: &NavigationConfig) {
		let empty = PortfolioDocument::default();
		let scene = build_scene(doc.unwrap_or(&empty), nav);
		self.images.preload(scene.image_urls());
		self.state.replace_scene(scene);
		self.gate.invalidate();
		if doc.is_none() {
			self.state.viewport.fit_to_view(false);
		} else if self.visible {
			self.state.fly_home(true);
		} else {
			self.state.viewport.suppress_next_fit();
			self.home_pending = true;
		}
	}

	fn set_visible(&mut self, visible: bool) {
		if visible == self.visible {
			return;
		}
		self.visible = visible;
		if visible {
			self.sync_size();
			self.state.viewport.activate();
			if std::mem::take(&mut self.home_pending) {
				self.state.fly_home(true);
			}
			debug!("mindmap: visible, resuming frame loop");
		} else {
			self.state.set_hover(None);
			debug!("mindmap: hidden, pausing frame loop");
		}
	}

	fn release(&mut self) {
		self.state.viewport.pointer_up();
		self.press = None;
	}
}

fn build_scene(doc: &PortfolioDocument, nav: &NavigationConfig) -> Scene {
	let tree = resolve_tree(doc.roots_structure.as_deref());
	let layout = MindmapLayout::compute(&tree, &LayoutConfig::page());
	Scene::build(&layout, &ContentLookup::new(doc), nav)
}

type Shared = Rc<RefCell<Option<CanvasContext>>>;
type FrameLoop = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

#[derive(Default)]
struct Listeners {
	observer: Option<IntersectionObserver>,
	on_intersect: Option<Closure<dyn FnMut(js_sys::Array)>>,
	on_resize: Option<Closure<dyn FnMut()>>,
}

fn request_frame(frame: &FrameLoop) {
	if let (Some(window), Some(cb)) = (web_sys::window(), frame.borrow().as_ref()) {
		let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
	}
}

/// Mark the canvas dirty and schedule a frame if it is visible and none is pending.
fn wake(context: &Shared, frame: &FrameLoop) {
	let schedule = match context.borrow_mut().as_mut() {
		Some(c) => {
			c.gate.invalidate();
			let idle = c.visible && !c.frame_pending;
			if idle {
				c.frame_pending = true;
				c.last_time = None;
			}
			idle
		}
		None => false,
	};
	if schedule {
		request_frame(frame);
	}
}

fn touch_points(list: &TouchList) -> Vec<(i32, i32)> {
	(0..list.length())
		.filter_map(|i| list.get(i))
		.map(|t| (t.client_x(), t.client_y()))
		.collect()
}

/// Interactive radial mind-map of the portfolio.
///
/// Renders the packaged tree immediately and rebuilds the scene when
/// `document` arrives. Clicking a node calls `on_select` with its name.
#[component]
pub fn MindmapCanvas(
	#[prop(into)] document: Signal<Option<PortfolioDocument>>,
	#[prop(into)] on_select: Callback<String>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Shared = Rc::new(RefCell::new(None));
	let frame: FrameLoop = Rc::new(RefCell::new(None));
	let listeners: Rc<RefCell<Listeners>> = Rc::new(RefCell::new(Listeners::default()));
	let zoom_level = RwSignal::new(100_u32);
	let nav = NavigationConfig::default();

	let (context_init, frame_init) = (context.clone(), frame.clone());
	Effect::new(move |_| {
		document.with(|doc| {
			if let Some(c) = context_init.borrow_mut().as_mut() {
				c.apply_document(doc.as_ref(), &nav);
				return;
			}
			let Some(canvas) = canvas_ref.get() else {
				return;
			};
			let canvas: HtmlCanvasElement = canvas.into();
			let Some(ctx) = canvas
				.get_context("2d")
				.ok()
				.flatten()
				.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
			else {
				warn!("mindmap: 2d canvas context unavailable");
				return;
			};

			let mut c = CanvasContext {
				state: MindmapState::new(Scene::default(), ViewportConfig::default(), 1.0, 1.0),
				canvas: canvas.clone(),
				ctx,
				theme: Theme::default(),
				images: ImageCache::default(),
				visible: false,
				frame_pending: false,
				last_time: None,
				gate: FrameGate::default(),
				home_pending: false,
				press: None,
			};
			c.sync_size();
			c.apply_document(doc.as_ref(), &nav);
			*context_init.borrow_mut() = Some(c);
		});

		let running = frame_init.borrow().is_some();
		if running {
			wake(&context_init, &frame_init);
			return;
		}
		let (context_anim, frame_inner) = (context_init.clone(), frame_init.clone());
		*frame_init.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			let (percent, again) = {
				let mut guard = context_anim.borrow_mut();
				let Some(c) = guard.as_mut() else {
					return;
				};
				if !c.visible {
					c.frame_pending = false;
					return;
				}
				let dt = c
					.last_time
					.map_or(1.0 / 60.0, |last| ((timestamp - last) / 1000.0).clamp(0.0, 0.1));
				c.last_time = Some(timestamp);
				let animating = c.state.tick(dt);
				let step = c.gate.frame(animating, c.images.ready_count(), c.images.loading());
				if step.draw {
					render::render(&c.state, &c.ctx, &c.theme, &c.images);
				}
				if !step.again {
					c.frame_pending = false;
				}
				(c.state.viewport.zoom_percent(), step.again)
			};
			if zoom_level.get_untracked() != percent {
				zoom_level.set(percent);
			}
			if again {
				request_frame(&frame_inner);
			}
		}));

		let mut l = listeners.borrow_mut();
		let (context_vis, frame_vis) = (context_init.clone(), frame_init.clone());
		let on_intersect = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
			let Some(visible) = entries
				.iter()
				.filter_map(|e| e.dyn_into::<IntersectionObserverEntry>().ok())
				.map(|e| e.is_intersecting())
				.last()
			else {
				return;
			};
			if let Some(c) = context_vis.borrow_mut().as_mut() {
				c.set_visible(visible);
			}
			wake(&context_vis, &frame_vis);
		});
		match (IntersectionObserver::new(on_intersect.as_ref().unchecked_ref()), canvas_ref.get()) {
			(Ok(observer), Some(canvas)) => {
				let canvas: HtmlCanvasElement = canvas.into();
				observer.observe(&canvas);
				l.observer = Some(observer);
			}
			_ => warn!("mindmap: visibility observer unavailable, frame loop stays paused"),
		}
		l.on_intersect = Some(on_intersect);

		let (context_resize, frame_resize) = (context_init.clone(), frame_init.clone());
		let on_resize = Closure::<dyn FnMut()>::new(move || {
			if let Some(c) = context_resize.borrow_mut().as_mut() {
				c.sync_size();
			}
			wake(&context_resize, &frame_resize);
		});
		if let Some(window) = web_sys::window() {
			let _ = window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
		}
		l.on_resize = Some(on_resize);
	});

	let (context_md, frame_md) = (context.clone(), frame.clone());
	let on_mousedown = move |ev: MouseEvent| {
		if let Some(c) = context_md.borrow_mut().as_mut() {
			let (x, y) = c.local_point(ev.client_x(), ev.client_y());
			match c.state.node_at(x, y) {
				Some(node) => {
					c.press = Some(Press {
						node,
						x,
						y,
						moved: false,
					})
				}
				None => c.state.viewport.pointer_down(x, y),
			}
		}
		wake(&context_md, &frame_md);
	};

	let (context_mm, frame_mm) = (context.clone(), frame.clone());
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(c) = context_mm.borrow_mut().as_mut() {
			let (x, y) = c.local_point(ev.client_x(), ev.client_y());
			if c.state.viewport.is_dragging() {
				c.state.viewport.pointer_move(x, y);
			} else {
				if let Some(press) = c.press.as_mut() {
					let slop = c.state.viewport.config().click_slop;
					press.moved |= (x - press.x).hypot(y - press.y) >= slop;
				}
				let hovered = c.state.node_at(x, y);
				c.state.set_hover(hovered);
				let cursor = if hovered.is_some() { "pointer" } else { "grab" };
				let _ = c.canvas.style().set_property("cursor", cursor);
			}
		}
		wake(&context_mm, &frame_mm);
	};

	let (context_mu, frame_mu) = (context.clone(), frame.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let selected = context_mu.borrow_mut().as_mut().and_then(|c| {
			let (x, y) = c.local_point(ev.client_x(), ev.client_y());
			let press = c.press.take();
			c.state.viewport.pointer_up();
			press
				.filter(|p| !p.moved && c.state.node_at(x, y) == Some(p.node))
				.and_then(|p| c.state.scene.nodes.get(p.node))
				.map(|n| n.name.clone())
		});
		wake(&context_mu, &frame_mu);
		if let Some(name) = selected {
			on_select.run(name);
		}
	};

	let (context_ml, frame_ml) = (context.clone(), frame.clone());
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(c) = context_ml.borrow_mut().as_mut() {
			c.release();
			c.state.set_hover(None);
		}
		wake(&context_ml, &frame_ml);
	};

	let (context_wh, frame_wh) = (context.clone(), frame.clone());
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(c) = context_wh.borrow_mut().as_mut() {
			let (x, y) = c.local_point(ev.client_x(), ev.client_y());
			c.state.viewport.wheel(x, y, ev.delta_y());
		}
		wake(&context_wh, &frame_wh);
	};

	let (context_dc, frame_dc) = (context.clone(), frame.clone());
	let on_dblclick = move |ev: MouseEvent| {
		if let Some(c) = context_dc.borrow_mut().as_mut() {
			let (x, y) = c.local_point(ev.client_x(), ev.client_y());
			if c.state.node_at(x, y).is_none() {
				c.state.viewport.fit_to_view(true);
			}
		}
		wake(&context_dc, &frame_dc);
	};

	let (context_ts, frame_ts) = (context.clone(), frame.clone());
	let on_touchstart = move |ev: TouchEvent| {
		if let Some(c) = context_ts.borrow_mut().as_mut() {
			let points = touch_points(&ev.touches());
			match points.as_slice() {
				[(tx, ty)] => {
					let (x, y) = c.local_point(*tx, *ty);
					match c.state.node_at(x, y) {
						Some(node) => {
							c.press = Some(Press {
								node,
								x,
								y,
								moved: false,
							})
						}
						None => c.state.viewport.pointer_down(x, y),
					}
				}
				[(ax, ay), (bx, by), ..] => {
					c.release();
					let distance = ((ax - bx) as f64).hypot((ay - by) as f64);
					c.state.viewport.pinch_start(distance);
				}
				[] => {}
			}
		}
		wake(&context_ts, &frame_ts);
	};

	let (context_tm, frame_tm) = (context.clone(), frame.clone());
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		if let Some(c) = context_tm.borrow_mut().as_mut() {
			let points = touch_points(&ev.touches());
			match points.as_slice() {
				[(tx, ty)] => {
					let (x, y) = c.local_point(*tx, *ty);
					if let Some(press) = c.press.as_mut() {
						let slop = c.state.viewport.config().click_slop;
						press.moved |= (x - press.x).hypot(y - press.y) >= slop;
					} else {
						c.state.viewport.pointer_move(x, y);
					}
				}
				[(ax, ay), (bx, by), ..] => {
					let distance = ((ax - bx) as f64).hypot((ay - by) as f64);
					let (mx, my) = c.local_point((ax + bx) / 2, (ay + by) / 2);
					c.state.viewport.pinch_move(distance, mx, my);
				}
				[] => {}
			}
		}
		wake(&context_tm, &frame_tm);
	};

	let (context_te, frame_te) = (context.clone(), frame.clone());
	let on_touchend = move |ev: TouchEvent| {
		let selected = context_te.borrow_mut().as_mut().and_then(|c| {
			if ev.touches().length() > 0 {
				return None;
			}
			let press = c.press.take();
			c.state.viewport.pointer_up();
			press
				.filter(|p| !p.moved)
				.and_then(|p| c.state.scene.nodes.get(p.node))
				.map(|n| n.name.clone())
		});
		wake(&context_te, &frame_te);
		if let Some(name) = selected {
			on_select.run(name);
		}
	};

	let (context_zi, frame_zi) = (context.clone(), frame.clone());
	let zoom_in = move |_| {
		if let Some(c) = context_zi.borrow_mut().as_mut() {
			c.state.viewport.zoom_step(1.0);
		}
		wake(&context_zi, &frame_zi);
	};
	let (context_zo, frame_zo) = (context.clone(), frame.clone());
	let zoom_out = move |_| {
		if let Some(c) = context_zo.borrow_mut().as_mut() {
			c.state.viewport.zoom_step(-1.0);
		}
		wake(&context_zo, &frame_zo);
	};
	let (context_fit, frame_fit) = (context.clone(), frame.clone());
	let zoom_fit = move |_| {
		if let Some(c) = context_fit.borrow_mut().as_mut() {
			c.state.viewport.fit_to_view(true);
		}
		wake(&context_fit, &frame_fit);
	};

	view! {
		<div class="mindmap-wrapper" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="mindmap-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:dblclick=on_dblclick
				on:touchstart=on_touchstart
				on:touchmove=on_touchmove
				on:touchend=on_touchend
				style="display: block; cursor: grab; touch-action: none;"
			/>
			<div class="zoom-controls">
				<button class="zoom-out" on:click=zoom_out>"−"</button>
				<span class="zoom-level">{move || format!("{}%", zoom_level.get())}</span>
				<button class="zoom-in" on:click=zoom_in>"+"</button>
				<button class="zoom-fit" on:click=zoom_fit>"Fit"</button>
			</div>
		</div>
	}
}
