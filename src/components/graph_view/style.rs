//! Style resolution: entity type + interaction flags → concrete appearance.
//!
//! Resolution is pure and total. Every type string, including unknown and
//! empty ones, yields a style; unknown types get the theme's fallback entry.
//! Animated transitions interpolate between two resolved styles with
//! [`NodeStyle::lerp`] instead of toggling classes.

use super::theme::{Color, NodeShape, Theme, TypeStyle};

/// Interaction flags that affect a node's appearance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StyleFlags {
	pub selected: bool,
	pub hovered: bool,
}

/// Fully resolved node appearance.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	pub fill: Color,
	pub shape: NodeShape,
	/// Diameter in world units.
	pub size: f64,
	pub border_width: f64,
	pub border_color: Color,
	pub label_color: Color,
	pub font_size: f64,
}

impl NodeStyle {
	/// Blend numeric and color attributes; the shape switches at the midpoint.
	pub fn lerp(&self, other: &NodeStyle, t: f64) -> NodeStyle {
		let t = t.clamp(0.0, 1.0);
		let mix = |a: f64, b: f64| a + (b - a) * t;
		NodeStyle {
			fill: self.fill.lerp(other.fill, t),
			shape: if t < 0.5 { self.shape } else { other.shape },
			size: mix(self.size, other.size),
			border_width: mix(self.border_width, other.border_width),
			border_color: self.border_color.lerp(other.border_color, t),
			label_color: self.label_color.lerp(other.label_color, t),
			font_size: mix(self.font_size, other.font_size),
		}
	}

	pub fn radius(&self) -> f64 {
		self.size / 2.0
	}
}

/// Fully resolved edge appearance.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeStyle {
	pub line_color: Color,
	pub width: f64,
	pub arrow_scale: f64,
	pub label_color: Color,
	pub font_size: f64,
	pub ghost_opacity: f64,
}

fn type_entry<'a>(theme: &'a Theme, kind: &str) -> &'a TypeStyle {
	theme
		.node
		.types
		.iter()
		.find(|t| t.kind.eq_ignore_ascii_case(kind))
		.unwrap_or(&theme.node.fallback)
}

/// Resolve the style of a node of type `kind`.
pub fn resolve_node(theme: &Theme, kind: &str, flags: StyleFlags) -> NodeStyle {
	let node = &theme.node;
	let entry = type_entry(theme, kind);

	let (fill, border_width, border_color) = if flags.selected {
		(
			entry.selected_fill.unwrap_or(entry.fill),
			node.selected_border_width,
			node.selected_border_color,
		)
	} else {
		(entry.fill, node.border_width, node.border_color)
	};

	NodeStyle {
		fill,
		shape: entry.shape,
		size: if flags.hovered {
			node.hover_size
		} else {
			node.size
		},
		border_width,
		border_color,
		label_color: node.label_color,
		font_size: node.font_size,
	}
}

/// Resolve the style of an edge. Highlighted edges touch the hovered or
/// selected node.
pub fn resolve_edge(theme: &Theme, highlighted: bool) -> EdgeStyle {
	let edge = &theme.edge;
	EdgeStyle {
		line_color: if highlighted {
			edge.highlight_color
		} else {
			edge.color
		},
		width: if highlighted {
			edge.width * 1.5
		} else {
			edge.width
		},
		arrow_scale: edge.arrow_scale,
		label_color: edge.label_color,
		font_size: edge.font_size,
		ghost_opacity: edge.ghost_opacity,
	}
}

/// Outline vertices for polygonal shapes, relative to the node center, for a
/// node of the given radius. Round shapes return `None` and are drawn with
/// arcs.
pub fn polygon(shape: NodeShape, radius: f64) -> Option<Vec<(f64, f64)>> {
	let r = radius;
	match shape {
		NodeShape::Ellipse | NodeShape::RoundRectangle => None,
		NodeShape::Diamond => Some(vec![(0.0, -r), (r, 0.0), (0.0, r), (-r, 0.0)]),
		NodeShape::Tag => Some(vec![
			(-r, -r),
			(r / 3.0, -r),
			(r, 0.0),
			(r / 3.0, r),
			(-r, r),
		]),
	}
}
