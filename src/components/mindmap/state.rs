//! Mind-map interaction state.
//!
//! [`Viewport`] is the pan/zoom state machine: idle, dragging with one
//! pointer, or pinching with two. Every transform write goes through one
//! clamp, and zooms keep the content point under the cursor (or pinch
//! midpoint) fixed on screen. [`HighlightState`] fades hover highlights in and
//! out per node. [`MindmapState`] owns both plus the scene, one instance per
//! mounted canvas.

use std::collections::{HashMap, HashSet};

use super::scale::{ScaleConfig, ScaledValues};
use super::scene::Scene;

/// Pan/zoom tunables.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewportConfig {
	/// Zoom floor. Every transform write clamps to `min_scale..=max_scale`.
	pub min_scale: f64,
	pub max_scale: f64,
	/// Scale change per wheel delta unit.
	pub wheel_speed: f64,
	/// Share of the viewport the content may fill when fitting.
	pub fit_margin: f64,
	/// Scale change of one zoom-button press.
	pub button_step: f64,
	/// Scale used when flying to the home node.
	pub home_scale: f64,
	/// Duration of eased fits and button zooms, in seconds.
	pub transition_secs: f64,
	/// Duration of the fly-to-home animation, in seconds.
	pub home_transition_secs: f64,
	/// Pointer travel (screen px) below which a press counts as a click.
	pub click_slop: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.2,
			max_scale: 2.0,
			wheel_speed: 0.001,
			fit_margin: 0.9,
			button_step: 0.15,
			home_scale: 1.2,
			transition_secs: 0.3,
			home_transition_secs: 1.0,
			click_slop: 4.0,
		}
	}
}

/// Combined translate + scale: `screen = content * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	pub fn screen_to_content(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	pub fn content_to_screen(&self, cx: f64, cy: f64) -> (f64, f64) {
		(cx * self.k + self.x, cy * self.k + self.y)
	}

	fn lerp(self, to: ViewTransform, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
	Idle,
	Dragging {
		start_x: f64,
		start_y: f64,
		origin_x: f64,
		origin_y: f64,
		travelled: f64,
	},
	Pinching {
		distance: f64,
	},
}

#[derive(Clone, Copy, Debug)]
struct Transition {
	from: ViewTransform,
	to: ViewTransform,
	elapsed: f64,
	duration: f64,
}

/// Strong ease-out, close to `cubic-bezier(0.16, 1, 0.3, 1)`.
fn ease_out(t: f64) -> f64 {
	1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(4)
}

/// Camera over the mind-map content.
#[derive(Clone, Debug)]
pub struct Viewport {
	config: ViewportConfig,
	transform: ViewTransform,
	gesture: Gesture,
	transition: Option<Transition>,
	width: f64,
	height: f64,
	content_width: f64,
	content_height: f64,
	skip_auto_fit: bool,
}

impl Viewport {
	/// Viewport of `width` x `height` screen pixels, fitted to the content.
	pub fn new(config: ViewportConfig, width: f64, height: f64, content_width: f64, content_height: f64) -> Self {
		let mut viewport = Self {
			config,
			transform: ViewTransform::default(),
			gesture: Gesture::Idle,
			transition: None,
			width,
			height,
			content_width,
			content_height,
			skip_auto_fit: false,
		};
		viewport.fit_to_view(false);
		viewport
	}

	/// Transform to draw with this frame.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Where the camera will rest once any running transition finishes.
	pub fn target(&self) -> ViewTransform {
		self.transition.map_or(self.transform, |t| t.to)
	}

	pub fn config(&self) -> &ViewportConfig {
		&self.config
	}

	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	/// Target zoom as a whole percentage, for the zoom label.
	pub fn zoom_percent(&self) -> u32 {
		(self.target().k * 100.0).round() as u32
	}

	pub fn is_dragging(&self) -> bool {
		matches!(self.gesture, Gesture::Dragging { .. })
	}

	pub fn is_pinching(&self) -> bool {
		matches!(self.gesture, Gesture::Pinching { .. })
	}

	/// Whether a camera transition is running.
	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	/// Track a new canvas size. The camera is left where it is.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	pub fn set_content_size(&mut self, width: f64, height: f64) {
		self.content_width = width;
		self.content_height = height;
	}

	fn clamp_scale(&self, k: f64) -> f64 {
		if k.is_finite() {
			k.clamp(self.config.min_scale, self.config.max_scale)
		} else {
			self.config.min_scale
		}
	}

	/// The only place transforms are written.
	fn apply(&mut self, to: ViewTransform, duration: Option<f64>) {
		let to = ViewTransform {
			k: self.clamp_scale(to.k),
			..to
		};
		match duration {
			Some(duration) if duration > 0.0 => {
				self.transition = Some(Transition {
					from: self.transform,
					to,
					elapsed: 0.0,
					duration,
				});
			}
			_ => {
				self.transition = None;
				self.transform = to;
			}
		}
	}

	fn eased(&self, animated: bool) -> Option<f64> {
		animated.then_some(self.config.transition_secs)
	}

	/// Scale the whole content into the viewport and centre it.
	pub fn fit_to_view(&mut self, animated: bool) {
		let mut k = 1.0_f64;
		if self.content_width > 0.0 {
			k = k.min(self.width * self.config.fit_margin / self.content_width);
		}
		if self.content_height > 0.0 {
			k = k.min(self.height * self.config.fit_margin / self.content_height);
		}
		let k = self.clamp_scale(k);
		let to = ViewTransform {
			x: (self.width - self.content_width * k) / 2.0,
			y: (self.height - self.content_height * k) / 2.0,
			k,
		};
		self.apply(to, self.eased(animated));
	}

	/// Skip the fit on the next [`Viewport::activate`], once.
	pub fn suppress_next_fit(&mut self) {
		self.skip_auto_fit = true;
	}

	/// Page became visible. Fits unless suppressed; returns whether it fitted.
	pub fn activate(&mut self) -> bool {
		if std::mem::take(&mut self.skip_auto_fit) {
			return false;
		}
		self.fit_to_view(true);
		true
	}

	/// Put content point `(cx, cy)` at the viewport centre at scale `k`.
	pub fn zoom_to(&mut self, cx: f64, cy: f64, k: f64, animated: bool) {
		let k = self.clamp_scale(k);
		let to = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
		let duration = animated.then_some(self.config.home_transition_secs);
		self.apply(to, duration);
	}

	/// Rescale to `k` keeping screen point `(sx, sy)` fixed.
	fn zoom_at(&mut self, sx: f64, sy: f64, k: f64, duration: Option<f64>) {
		let base = self.target();
		let (cx, cy) = base.screen_to_content(sx, sy);
		let k = self.clamp_scale(k);
		let to = ViewTransform {
			x: sx - cx * k,
			y: sy - cy * k,
			k,
		};
		self.apply(to, duration);
	}

	/// Zoom-button step around the viewport centre.
	pub fn zoom_step(&mut self, steps: f64) {
		let k = self.target().k + steps * self.config.button_step;
		self.zoom_at(self.width / 2.0, self.height / 2.0, k, self.eased(true));
	}

	/// Zoom by wheel delta, keeping the content point under the cursor fixed.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		self.settle();
		let k = self.transform.k - delta_y * self.config.wheel_speed;
		self.zoom_at(sx, sy, k, None);
	}

	/// Stop any transition where it currently is.
	fn settle(&mut self) {
		self.transition = None;
	}

	/// Start a pan drag on the background.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		self.settle();
		self.gesture = Gesture::Dragging {
			start_x: sx,
			start_y: sy,
			origin_x: self.transform.x,
			origin_y: self.transform.y,
			travelled: 0.0,
		};
	}

	/// Pan by the total pointer delta since the drag started.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if let Gesture::Dragging {
			start_x,
			start_y,
			origin_x,
			origin_y,
			travelled,
		} = self.gesture
		{
			let (dx, dy) = (sx - start_x, sy - start_y);
			self.gesture = Gesture::Dragging {
				start_x,
				start_y,
				origin_x,
				origin_y,
				travelled: travelled.max(dx.hypot(dy)),
			};
			let to = ViewTransform {
				x: origin_x + dx,
				y: origin_y + dy,
				k: self.transform.k,
			};
			self.apply(to, None);
		}
	}

	/// End a drag. Returns `true` when the pointer barely moved (a click).
	pub fn pointer_up(&mut self) -> bool {
		let was_click = match self.gesture {
			Gesture::Dragging { travelled, .. } => travelled < self.config.click_slop,
			_ => false,
		};
		self.gesture = Gesture::Idle;
		was_click
	}

	pub fn pinch_start(&mut self, distance: f64) {
		self.settle();
		self.gesture = Gesture::Pinching { distance };
	}

	/// Scale by the ratio of inter-touch distances, anchored at the midpoint.
	pub fn pinch_move(&mut self, distance: f64, mid_x: f64, mid_y: f64) {
		let Gesture::Pinching { distance: last } = self.gesture else {
			return;
		};
		if last > 0.0 && distance > 0.0 {
			let k = self.transform.k * distance / last;
			self.zoom_at(mid_x, mid_y, k, None);
		}
		self.gesture = Gesture::Pinching { distance };
	}

	/// Advance a running transition. Returns whether one is still running.
	pub fn tick(&mut self, dt: f64) -> bool {
		let Some(mut transition) = self.transition else {
			return false;
		};
		transition.elapsed += dt;
		let t = transition.elapsed / transition.duration;
		if t >= 1.0 {
			self.transform = transition.to;
			self.transition = None;
			return false;
		}
		self.transform = transition.from.lerp(transition.to, ease_out(t));
		self.transition = Some(transition);
		true
	}
}

/// Seconds a highlight is held before it may start fading out, so brushing
/// past a node does not flash it.
const MIN_HOLD_TIME: f64 = 0.12;
const FADE_IN_SPEED: f64 = 6.0;
const FADE_OUT_SPEED: f64 = 4.0;
const VISIBLE_EPSILON: f64 = 0.005;

/// Per-node hover highlight with exponential smoothing.
///
/// The hovered node and its direct parent and children form the target set.
/// Intensities move towards 1 inside the set and decay towards 0 outside it
/// once their hold timer has run out.
#[derive(Clone, Debug, Default)]
pub struct HighlightState {
	hovered: Option<usize>,
	target: HashSet<usize>,
	intensity: HashMap<usize, f64>,
	ring: HashMap<usize, f64>,
	hold: HashMap<usize, f64>,
	max: f64,
}

impl HighlightState {
	pub fn hovered(&self) -> Option<usize> {
		self.hovered
	}

	/// Move the highlight to `node` and its neighbours along `edges`.
	pub fn set_hover(&mut self, node: Option<usize>, edges: &[(usize, usize)]) {
		if self.hovered == node {
			return;
		}
		self.hovered = node;
		self.target.clear();
		let Some(idx) = node else {
			return;
		};
		self.target.insert(idx);
		for &(source, target) in edges {
			if source == idx {
				self.target.insert(target);
			} else if target == idx {
				self.target.insert(source);
			}
		}
		for &n in &self.target {
			self.hold.insert(n, MIN_HOLD_TIME);
		}
	}

	/// `value += (target - value) * (1 - e^(-speed * dt))`
	pub fn tick(&mut self, dt: f64) {
		let rise = 1.0 - (-FADE_IN_SPEED * dt).exp();
		let decay = (-FADE_OUT_SPEED * dt).exp();

		for &n in &self.target {
			let v = self.intensity.entry(n).or_insert(0.0);
			*v += (1.0 - *v) * rise;
		}
		if let Some(n) = self.hovered {
			let v = self.ring.entry(n).or_insert(0.0);
			*v += (1.0 - *v) * rise;
		}

		let target = &self.target;
		self.hold.retain(|n, timer| {
			if target.contains(n) {
				return true;
			}
			*timer -= dt;
			*timer > 0.0
		});

		let hold = &self.hold;
		let mut max: f64 = 0.0;
		self.intensity.retain(|n, v| {
			if !target.contains(n) && !hold.contains_key(n) {
				*v *= decay;
			}
			let keep = target.contains(n) || *v > VISIBLE_EPSILON;
			if keep {
				max = max.max(*v);
			}
			keep
		});

		let hovered = self.hovered;
		self.ring.retain(|n, v| {
			if hovered == Some(*n) {
				return true;
			}
			if !hold.contains_key(n) {
				*v *= decay;
			}
			*v > VISIBLE_EPSILON
		});
		self.max = max;
	}

	/// Current highlight of node `idx`, in [0, 1].
	pub fn node_intensity(&self, idx: usize) -> f64 {
		self.intensity.get(&idx).copied().unwrap_or(0.0)
	}

	pub fn ring_intensity(&self, idx: usize) -> f64 {
		self.ring.get(&idx).copied().unwrap_or(0.0)
	}

	/// Geometric mean of the endpoint intensities.
	pub fn edge_intensity(&self, a: usize, b: usize) -> f64 {
		(self.node_intensity(a) * self.node_intensity(b)).sqrt()
	}

	pub fn max_intensity(&self) -> f64 {
		self.max
	}

	/// Whether anything is still fading.
	pub fn is_active(&self) -> bool {
		self.hovered.is_some() || !self.intensity.is_empty() || !self.ring.is_empty()
	}
}

/// What the frame loop does with one animation frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStep {
	/// Repaint the canvas this frame.
	pub draw: bool,
	/// Schedule another frame after this one.
	pub again: bool,
}

/// Redraw bookkeeping for the frame loop, so an idle canvas is not repainted.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameGate {
	dirty: bool,
	ready_images: usize,
}

impl FrameGate {
	/// Something outside the animation changed: input, data, size.
	pub fn invalidate(&mut self) {
		self.dirty = true;
	}

	/// Whether the next frame must repaint.
	pub fn is_dirty(&self) -> bool {
		self.dirty
	}

	/// `animating` is what [`MindmapState::tick`] returned this frame.
	/// `ready_images` counts decoded images, `loading` whether more are coming.
	pub fn frame(&mut self, animating: bool, ready_images: usize, loading: bool) -> FrameStep {
		let draw = self.dirty || animating || ready_images != self.ready_images;
		self.ready_images = ready_images;
		// Motion ends with one more frame so the settled state is drawn.
		self.dirty = animating;
		FrameStep {
			draw,
			again: animating || loading,
		}
	}
}

/// Everything one mounted mind-map canvas mutates.
pub struct MindmapState {
	pub scene: Scene,
	pub viewport: Viewport,
	pub highlight: HighlightState,
	/// Zoom-dependent sizes used for drawing and hit testing.
	pub scale: ScaleConfig,
}

impl MindmapState {
	pub fn new(scene: Scene, config: ViewportConfig, width: f64, height: f64) -> Self {
		let viewport = Viewport::new(config, width, height, scene.width, scene.height);
		Self {
			scene,
			viewport,
			highlight: HighlightState::default(),
			scale: ScaleConfig::default(),
		}
	}

	/// Swap in a rebuilt scene, keeping the camera.
	pub fn replace_scene(&mut self, scene: Scene) {
		self.viewport.set_content_size(scene.width, scene.height);
		self.highlight = HighlightState::default();
		self.scene = scene;
	}

	/// Node under screen point `(sx, sy)`.
	pub fn node_at(&self, sx: f64, sy: f64) -> Option<usize> {
		let transform = self.viewport.transform();
		let (cx, cy) = transform.screen_to_content(sx, sy);
		let scaled = ScaledValues::new(&self.scale, transform.k);
		self.scene.node_at(cx, cy, &scaled)
	}

	/// Hover `node`, lighting up its direct neighbours.
	pub fn set_hover(&mut self, node: Option<usize>) {
		self.highlight.set_hover(node, &self.scene.edges);
	}

	/// Centre the home node at the configured home scale.
	pub fn fly_home(&mut self, animated: bool) {
		if let Some(node) = self.scene.home_node() {
			let (x, y) = (node.x, node.y);
			let k = self.viewport.config().home_scale;
			self.viewport.zoom_to(x, y, k, animated);
		}
	}

	/// Advance animations. Returns whether another frame is needed.
	pub fn tick(&mut self, dt: f64) -> bool {
		let moving = self.viewport.tick(dt);
		self.highlight.tick(dt);
		moving || self.highlight.is_active()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn viewport() -> Viewport {
		Viewport::new(ViewportConfig::default(), 800.0, 600.0, 2000.0, 1000.0)
	}

	#[test]
	fn fit_scales_to_margin_and_centres() {
		let v = viewport();
		let t = v.transform();
		assert!((t.k - 0.36).abs() < 1e-9);
		assert!((t.x - (800.0 - 2000.0 * 0.36) / 2.0).abs() < 1e-9);
		assert!((t.y - (600.0 - 1000.0 * 0.36) / 2.0).abs() < 1e-9);
	}

	#[test]
	fn fit_never_upscales() {
		let v = Viewport::new(ViewportConfig::default(), 800.0, 600.0, 100.0, 100.0);
		assert_eq!(v.transform().k, 1.0);
	}

	#[test]
	fn fit_respects_minimum_scale() {
		let v = Viewport::new(ViewportConfig::default(), 800.0, 600.0, 100_000.0, 100_000.0);
		assert_eq!(v.transform().k, 0.2);
	}

	#[test]
	fn drag_pans_by_total_delta() {
		let mut v = viewport();
		let start = v.transform();
		v.pointer_down(100.0, 100.0);
		v.pointer_move(110.0, 90.0);
		v.pointer_move(130.0, 120.0);
		let t = v.transform();
		assert!((t.x - (start.x + 30.0)).abs() < 1e-9);
		assert!((t.y - (start.y + 20.0)).abs() < 1e-9);
		assert_eq!(t.k, start.k);
		assert!(!v.pointer_up());
	}

	#[test]
	fn short_press_is_a_click() {
		let mut v = viewport();
		v.pointer_down(100.0, 100.0);
		v.pointer_move(101.0, 101.0);
		assert!(v.pointer_up());
		assert!(!v.is_dragging());
	}

	#[test]
	fn suppression_is_one_shot() {
		let mut v = viewport();
		v.suppress_next_fit();
		assert!(!v.activate());
		assert!(v.activate());
	}

	#[test]
	fn zoom_to_centres_target() {
		let mut v = viewport();
		v.zoom_to(500.0, 250.0, 1.2, false);
		let t = v.transform();
		let (sx, sy) = t.content_to_screen(500.0, 250.0);
		assert!((sx - 400.0).abs() < 1e-9);
		assert!((sy - 300.0).abs() < 1e-9);
		assert!((t.k - 1.2).abs() < 1e-9);
	}

	#[test]
	fn animated_zoom_reaches_target() {
		let mut v = viewport();
		v.zoom_to(500.0, 250.0, 1.2, true);
		assert!(v.is_animating());
		assert_eq!(v.zoom_percent(), 120);
		let mut frames = 0;
		while v.tick(1.0 / 60.0) {
			frames += 1;
			assert!(frames < 120);
		}
		assert_eq!(v.transform(), v.target());
		assert!((v.transform().k - 1.2).abs() < 1e-9);
	}

	#[test]
	fn buttons_step_around_centre() {
		let mut v = viewport();
		let before = v.target().screen_to_content(400.0, 300.0);
		v.zoom_step(1.0);
		let after = v.target();
		assert!((after.k - 0.51).abs() < 1e-9);
		let (sx, sy) = after.content_to_screen(before.0, before.1);
		assert!((sx - 400.0).abs() < 1e-9);
		assert!((sy - 300.0).abs() < 1e-9);
	}

	#[test]
	fn highlight_covers_neighbours_and_fades() {
		let edges = [(0, 1), (1, 2), (0, 3)];
		let mut h = HighlightState::default();
		h.set_hover(Some(1), &edges);
		for _ in 0..30 {
			h.tick(1.0 / 60.0);
		}
		assert!(h.node_intensity(1) > 0.9);
		assert!(h.node_intensity(0) > 0.9);
		assert!(h.node_intensity(2) > 0.9);
		assert_eq!(h.node_intensity(3), 0.0);
		assert!(h.ring_intensity(1) > 0.9);
		assert!(h.edge_intensity(0, 1) > 0.9);

		h.set_hover(None, &edges);
		// Held briefly before fading.
		h.tick(0.05);
		assert!(h.node_intensity(1) > 0.9);
		for _ in 0..240 {
			h.tick(1.0 / 60.0);
		}
		assert!(!h.is_active());
		assert_eq!(h.max_intensity(), 0.0);
	}

	#[test]
	fn idle_frames_do_not_redraw() {
		let mut gate = FrameGate::default();
		gate.invalidate();
		assert_eq!(gate.frame(false, 0, false), FrameStep { draw: true, again: false });
		assert!(!gate.is_dirty());
		assert_eq!(gate.frame(false, 0, false), FrameStep { draw: false, again: false });
	}

	#[test]
	fn motion_draws_through_the_settling_frame() {
		let mut gate = FrameGate::default();
		assert_eq!(gate.frame(true, 0, false), FrameStep { draw: true, again: true });
		// The tick that lands on the target reports no motion but moved the camera.
		assert_eq!(gate.frame(false, 0, false), FrameStep { draw: true, again: false });
		assert_eq!(gate.frame(false, 0, false), FrameStep { draw: false, again: false });
	}

	#[test]
	fn loading_images_poll_and_draw_on_arrival() {
		let mut gate = FrameGate::default();
		assert_eq!(gate.frame(false, 0, true), FrameStep { draw: false, again: true });
		assert_eq!(gate.frame(false, 1, false), FrameStep { draw: true, again: false });
		assert_eq!(gate.frame(false, 1, false), FrameStep { draw: false, again: false });
	}

	#[test]
	fn settled_transition_leaves_gate_idle() {
		let mut state = MindmapState::new(Scene::default(), ViewportConfig::default(), 800.0, 600.0);
		let mut gate = FrameGate::default();
		state.viewport.zoom_step(1.0);
		let mut drawn = 0;
		for _ in 0..120 {
			let step = gate.frame(state.tick(1.0 / 60.0), 0, false);
			drawn += usize::from(step.draw);
			if !step.again {
				break;
			}
		}
		assert!(!state.viewport.is_animating());
		assert!(drawn > 1);
		assert!(!gate.frame(state.tick(1.0 / 60.0), 0, false).draw);
	}
}
