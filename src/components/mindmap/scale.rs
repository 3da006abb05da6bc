//! Zoom-dependent sizing of mind-map visuals.
//!
//! Content space is the layout's pixel grid; screen space is canvas pixels.
//! Drawing happens after the view transform is applied, so every value in
//! [`ScaledValues`] is in content units.
//!
//! - [`ScaleBehavior::World`] keeps a constant content size (grows on zoom in).
//! - [`ScaleBehavior::Screen`] keeps a constant pixel size.
//! - [`ScaleBehavior::Clamped`] is world sized within pixel bounds.

/// How a size reacts to the zoom factor `k`.
#[derive(Clone, Debug, PartialEq)]
pub enum ScaleBehavior {
	World,
	Screen,
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// Content-space size for `base` at zoom `k`.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped { min_screen, max_screen } => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// How an opacity reacts to the zoom factor `k`.
#[derive(Clone, Debug, PartialEq)]
pub enum AlphaBehavior {
	Constant,
	/// Invisible at `zero_alpha_k` and below, opaque from `full_alpha_k`.
	Fade { zero_alpha_k: f64, full_alpha_k: f64 },
}

impl AlphaBehavior {
	pub fn apply(&self, k: f64) -> f64 {
		match self {
			AlphaBehavior::Constant => 1.0,
			AlphaBehavior::Fade {
				zero_alpha_k,
				full_alpha_k,
			} => {
				if zero_alpha_k == full_alpha_k {
					return 1.0;
				}
				((k - zero_alpha_k) / (full_alpha_k - zero_alpha_k)).clamp(0.0, 1.0)
			}
		}
	}
}

/// Node sizes and how they follow zoom.
#[derive(Clone, Debug)]
pub struct NodeScaleConfig {
	/// Radius of a label-only marker dot.
	pub marker_radius: f64,
	pub marker_behavior: ScaleBehavior,
	/// Radius of an image preview disc.
	pub preview_radius: f64,
	pub preview_behavior: ScaleBehavior,
	/// Extra hit-test reach around either shape, in screen pixels.
	pub hit_slop: f64,
}

/// Label size and depth-dependent fading.
#[derive(Clone, Debug)]
pub struct LabelScaleConfig {
	/// Font size in pixels at `k = 1`.
	pub size: f64,
	pub size_behavior: ScaleBehavior,
	/// Labels at this depth or deeper use `deep_alpha`.
	pub deep_from: usize,
	pub shallow_alpha: AlphaBehavior,
	pub deep_alpha: AlphaBehavior,
}

#[derive(Clone, Debug)]
pub struct EdgeScaleConfig {
	/// Line width in screen pixels.
	pub line_width: f64,
}

/// Hover ring geometry.
#[derive(Clone, Debug)]
pub struct GlowScaleConfig {
	/// Hover ring stroke width in screen pixels.
	pub ring_width: f64,
	/// Ring gap from the node edge in screen pixels.
	pub ring_offset: f64,
}

/// Every zoom-dependent size the renderer uses.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	pub node: NodeScaleConfig,
	pub label: LabelScaleConfig,
	pub edge: EdgeScaleConfig,
	pub glow: GlowScaleConfig,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node: NodeScaleConfig {
				marker_radius: 10.0,
				marker_behavior: ScaleBehavior::Clamped {
					min_screen: 4.0,
					max_screen: f64::INFINITY,
				},
				preview_radius: 70.0,
				preview_behavior: ScaleBehavior::World,
				hit_slop: 6.0,
			},
			label: LabelScaleConfig {
				size: 18.0,
				size_behavior: ScaleBehavior::Clamped {
					min_screen: 9.0,
					max_screen: 28.0,
				},
				deep_from: 3,
				shallow_alpha: AlphaBehavior::Constant,
				deep_alpha: AlphaBehavior::Fade {
					zero_alpha_k: 0.25,
					full_alpha_k: 0.45,
				},
			},
			edge: EdgeScaleConfig { line_width: 1.0 },
			glow: GlowScaleConfig {
				ring_width: 2.0,
				ring_offset: 4.0,
			},
		}
	}
}

/// Sizes for one frame at zoom `k`, in content units.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	pub k: f64,
	pub marker_radius: f64,
	pub preview_radius: f64,
	/// Hit-test reach, already divided by `k`.
	pub hit_slop: f64,
	pub label_size: f64,
	/// CSS font shorthand for `label_size`.
	pub label_font: String,
	pub shallow_label_alpha: f64,
	pub deep_label_alpha: f64,
	pub deep_from: usize,
	pub edge_line_width: f64,
	pub ring_width: f64,
	pub ring_offset: f64,
}

impl ScaledValues {
	/// Resolve `config` at zoom `k`.
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let label_size = config.label.size_behavior.apply(config.label.size, k);
		Self {
			k,
			marker_radius: config.node.marker_behavior.apply(config.node.marker_radius, k),
			preview_radius: config.node.preview_behavior.apply(config.node.preview_radius, k),
			hit_slop: config.node.hit_slop / k,
			label_size,
			label_font: format!("{label_size}px sans-serif"),
			shallow_label_alpha: config.label.shallow_alpha.apply(k),
			deep_label_alpha: config.label.deep_alpha.apply(k),
			deep_from: config.label.deep_from,
			edge_line_width: config.edge.line_width / k,
			ring_width: config.glow.ring_width / k,
			ring_offset: config.glow.ring_offset / k,
		}
	}

	/// Label opacity for a node at `depth`.
	pub fn label_alpha(&self, depth: usize) -> f64 {
		if depth >= self.deep_from {
			self.deep_label_alpha
		} else {
			self.shallow_label_alpha
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn behaviors() {
		assert_eq!(ScaleBehavior::World.apply(10.0, 2.0), 10.0);
		assert_eq!(ScaleBehavior::Screen.apply(10.0, 2.0), 5.0);
		let clamped = ScaleBehavior::Clamped {
			min_screen: 4.0,
			max_screen: 8.0,
		};
		// 10 content units at k=0.2 would be 2px on screen.
		assert_eq!(clamped.apply(10.0, 0.2), 20.0);
		assert_eq!(clamped.apply(10.0, 2.0), 4.0);
	}

	#[test]
	fn deep_labels_fade_when_zoomed_out() {
		let config = ScaleConfig::default();
		let far = ScaledValues::new(&config, 0.2);
		let near = ScaledValues::new(&config, 1.0);
		assert_eq!(far.label_alpha(4), 0.0);
		assert_eq!(far.label_alpha(1), 1.0);
		assert_eq!(near.label_alpha(4), 1.0);
	}
}
