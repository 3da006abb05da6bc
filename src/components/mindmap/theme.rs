//! Colours for the mind-map canvas.

/// RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Linear interpolation, `t` clamped to [0, 1].
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
		Self {
			r: mix(self.r, other.r),
			g: mix(self.g, other.g),
			b: mix(self.b, other.b),
			a: self.a * (1.0 - t) + other.a * t,
		}
	}

	/// Hex when opaque, `rgba()` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Canvas palette. Depth colours repeat past the last entry.
#[derive(Clone, Debug)]
pub struct Theme {
	pub background: Color,
	/// Centre of the radial background gradient.
	pub background_glow: Color,
	pub edge: Color,
	/// Edge colour at full highlight.
	pub edge_highlight: Color,
	pub label: Color,
	pub preview_border: Color,
	pub ring: Color,
	/// Marker colour per depth ring.
	pub depth_colors: Vec<Color>,
}

impl Theme {
	/// Dark night-sky theme of the site.
	pub fn night() -> Self {
		Self {
			background: Color::rgb(10, 10, 14),
			background_glow: Color::rgb(24, 26, 36),
			edge: Color::rgba(255, 255, 255, 0.2),
			edge_highlight: Color::rgba(255, 255, 255, 0.75),
			label: Color::rgba(255, 255, 255, 0.9),
			preview_border: Color::rgba(255, 255, 255, 0.35),
			ring: Color::rgb(255, 255, 255),
			depth_colors: vec![
				Color::rgb(255, 214, 120), // centre
				Color::rgb(129, 161, 193),
				Color::rgb(119, 158, 165),
				Color::rgb(143, 163, 180),
				Color::rgb(122, 153, 168),
				Color::rgb(100, 148, 160),
			],
		}
	}

	pub fn depth_color(&self, depth: usize) -> Color {
		match self.depth_colors.len() {
			0 => self.label,
			n => self.depth_colors[depth.min(n - 1)],
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::night()
	}
}
