//! Visual theming for the graph view.
//!
//! A theme is plain data: background, edge colors, and the per-type node
//! table. [`style`](super::style) turns it into concrete per-element styles.

/// Straight-alpha sRGB color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	/// Opacity in `[0, 1]`.
	pub a: f64,
}

impl Color {
	pub const WHITE: Color = Color::rgb(255, 255, 255);
	const BLACK: Color = Color::rgb(0, 0, 0);

	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self::rgba(r, g, b, 1.0)
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Color { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Color { a, ..self }
	}

	/// Move the channels towards white; `amount` 1.0 gives white. Keeps alpha.
	pub fn lighten(self, amount: f64) -> Self {
		self.lerp(Self::WHITE.with_alpha(self.a), amount)
	}

	/// Move the channels towards black; `amount` 1.0 gives black. Keeps alpha.
	pub fn darken(self, amount: f64) -> Self {
		self.lerp(Self::BLACK.with_alpha(self.a), amount)
	}

	/// Channel-wise blend, `t` 0.0 is `self` and 1.0 is `other`.
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
		Color {
			r: mix(self.r, other.r),
			g: mix(self.g, other.g),
			b: mix(self.b, other.b),
			a: self.a + (other.a - self.a) * t,
		}
	}

	/// `#rrggbb` when opaque, `rgba(...)` otherwise.
	pub fn to_css(self) -> String {
		let Color { r, g, b, a } = self;
		if a >= 0.999 {
			format!("#{r:02x}{g:02x}{b:02x}")
		} else {
			format!("rgba({r}, {g}, {b}, {a})")
		}
	}
}

/// Outline drawn for a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeShape {
	Ellipse,
	RoundRectangle,
	Diamond,
	/// Rectangle with a pointed right side, like a luggage tag.
	Tag,
}

/// Type-specific overrides for one entity type.
#[derive(Clone, Debug)]
pub struct TypeStyle {
	/// Type name, matched ignoring ASCII case.
	pub kind: &'static str,
	pub fill: Color,
	pub shape: NodeShape,
	/// Fill used while selected. `None` keeps the type fill.
	pub selected_fill: Option<Color>,
}

/// Node appearance shared by all types.
#[derive(Clone, Debug)]
pub struct NodeTheme {
	/// Used for types missing from `types`.
	pub fallback: TypeStyle,
	pub types: Vec<TypeStyle>,
	/// Diameter in world units.
	pub size: f64,
	/// Diameter while hovered.
	pub hover_size: f64,
	pub border_width: f64,
	pub border_color: Color,
	pub selected_border_width: f64,
	pub selected_border_color: Color,
	pub label_color: Color,
	/// Label font size in world units.
	pub font_size: f64,
	pub font_family: &'static str,
	/// Shade node fills with a radial highlight.
	pub use_gradient: bool,
}

/// Edge appearance.
#[derive(Clone, Debug)]
pub struct EdgeTheme {
	pub color: Color,
	/// Color of edges touching the hovered or selected node.
	pub highlight_color: Color,
	pub width: f64,
	pub arrow_scale: f64,
	pub label_color: Color,
	pub font_size: f64,
	/// Opacity of the offset shadow line (0 disables it).
	pub ghost_opacity: f64,
	pub ghost_offset: (f64, f64),
}

/// Canvas backdrop.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	/// Edge color, or the whole fill when `use_gradient` is off.
	pub color: Color,
	/// Center color of the radial gradient.
	pub color_secondary: Color,
	pub use_gradient: bool,
}

/// Everything the renderer needs to know about colors and sizes.
#[derive(Clone, Debug)]
pub struct Theme {
	pub name: &'static str,
	pub background: BackgroundStyle,
	pub node: NodeTheme,
	pub edge: EdgeTheme,
}

impl Theme {
	/// Dark knowledge-graph theme with per-type colors and shapes (default).
	pub fn default_theme() -> Self {
		Self {
			name: "default",
			background: BackgroundStyle {
				color: Color::rgb(15, 23, 42),
				color_secondary: Color::rgb(30, 41, 59),
				use_gradient: true,
			},
			node: NodeTheme {
				fallback: TypeStyle {
					kind: "Entity",
					fill: Color::rgb(99, 102, 241),
					shape: NodeShape::Ellipse,
					selected_fill: Some(Color::rgb(79, 70, 229)),
				},
				types: vec![
					TypeStyle {
						kind: "Company",
						fill: Color::rgb(16, 185, 129),
						shape: NodeShape::RoundRectangle,
						selected_fill: None,
					},
					TypeStyle {
						kind: "Person",
						fill: Color::rgb(245, 158, 11),
						shape: NodeShape::Ellipse,
						selected_fill: None,
					},
					TypeStyle {
						kind: "Feature",
						fill: Color::rgb(139, 92, 246),
						shape: NodeShape::Diamond,
						selected_fill: None,
					},
					TypeStyle {
						kind: "Date",
						fill: Color::rgb(239, 68, 68),
						shape: NodeShape::Tag,
						selected_fill: None,
					},
				],
				size: 50.0,
				hover_size: 60.0,
				border_width: 3.0,
				border_color: Color::rgba(255, 255, 255, 0.2),
				selected_border_width: 4.0,
				selected_border_color: Color::WHITE,
				label_color: Color::WHITE,
				font_size: 10.0,
				font_family: "Outfit, sans-serif",
				use_gradient: true,
			},
			edge: EdgeTheme {
				color: Color::rgba(148, 163, 184, 0.3),
				highlight_color: Color::rgba(148, 163, 184, 0.8),
				width: 2.0,
				arrow_scale: 1.2,
				label_color: Color::rgb(148, 163, 184),
				font_size: 8.0,
				ghost_opacity: 0.1,
				ghost_offset: (1.0, 1.0),
			},
		}
	}

	/// Flat light variant for embedding on white pages.
	pub fn light() -> Self {
		let mut theme = Self::default_theme();
		theme.name = "light";
		theme.background = BackgroundStyle {
			color: Color::rgb(248, 250, 252),
			color_secondary: Color::rgb(248, 250, 252),
			use_gradient: false,
		};
		theme.node.use_gradient = false;
		theme.node.border_color = Color::rgba(15, 23, 42, 0.2);
		theme.node.selected_border_color = Color::rgb(15, 23, 42);
		theme.edge.color = Color::rgba(71, 85, 105, 0.4);
		theme.edge.highlight_color = Color::rgba(71, 85, 105, 0.9);
		theme.edge.label_color = Color::rgb(71, 85, 105);
		theme.edge.ghost_opacity = 0.0;
		theme
	}

	/// Look up a built-in theme by name, falling back to the default.
	pub fn by_name(name: &str) -> Self {
		match name {
			"light" => Self::light(),
			_ => Self::default_theme(),
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::default_theme()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_opaque_css_is_hex() {
		assert_eq!(Color::rgb(99, 102, 241).to_css(), "#6366f1");
	}

	#[test]
	fn test_lerp_endpoints() {
		let a = Color::rgba(0, 0, 0, 0.0);
		let b = Color::rgb(200, 100, 50);
		assert_eq!(a.lerp(b, 0.0), a);
		assert_eq!(a.lerp(b, 1.0), b);
		assert_eq!(a.lerp(b, 0.5), Color::rgba(100, 50, 25, 0.5));
	}

	#[test]
	fn test_shading_keeps_alpha() {
		let grey = Color::rgba(100, 100, 100, 0.5);
		assert_eq!(grey.lighten(1.0), Color::WHITE.with_alpha(0.5));
		assert_eq!(grey.darken(0.5), Color::rgba(50, 50, 50, 0.5));
		assert_eq!(grey.lighten(0.0), grey);
	}

	#[test]
	fn test_by_name_falls_back_to_default() {
		assert_eq!(Theme::by_name("light").name, "light");
		assert_eq!(Theme::by_name("neon").name, "default");
	}

	#[test]
	fn test_translucent_css() {
		assert_eq!(
			Color::rgba(148, 163, 184, 0.3).to_css(),
			"rgba(148, 163, 184, 0.3)"
		);
	}
}
