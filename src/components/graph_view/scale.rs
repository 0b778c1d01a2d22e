//! How label, line and arrow sizes react to zoom.
//!
//! Layout coordinates are world units; the canvas draws them multiplied by the
//! zoom factor `k`. Node sizes always stay in world units (they come from the
//! style resolver), but the small details drawn around them need rules so
//! they remain legible and clickable at any zoom:
//!
//! - a label that shrinks below a few pixels is unreadable,
//! - a label that grows to 60px when zoomed in crowds its node,
//! - hit padding should feel the same to the pointer regardless of zoom.
//!
//! Every rule maps a base size in world units to the world-unit size to draw
//! with, so callers can use the result directly after the canvas transform.

/// Zoom rule for one size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoomRule {
	/// Grows and shrinks with the graph.
	Scales,
	/// Fixed on-screen size in pixels.
	Pixels,
	/// Grows with the graph, but only between `min_px` and `max_px` on screen.
	Bounded { min_px: f64, max_px: f64 },
}

impl ZoomRule {
	/// World-unit size to draw `base` with at zoom `k`.
	pub fn apply(self, base: f64, k: f64) -> f64 {
		match self {
			ZoomRule::Scales => base,
			ZoomRule::Pixels => base / k,
			// on screen: base * k, kept within [min_px, max_px]
			ZoomRule::Bounded { min_px, max_px } => base.max(min_px / k).min(max_px / k),
		}
	}
}

/// Opacity multiplier as a function of zoom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoomFade {
	Never,
	/// Invisible at or below `hidden_at`, fully visible at or above
	/// `visible_at`, linear in between.
	Between { hidden_at: f64, visible_at: f64 },
}

impl ZoomFade {
	pub fn alpha(self, k: f64) -> f64 {
		match self {
			ZoomFade::Never => 1.0,
			ZoomFade::Between {
				hidden_at,
				visible_at,
			} => {
				let span = visible_at - hidden_at;
				if span.abs() < f64::EPSILON {
					return if k >= visible_at { 1.0 } else { 0.0 };
				}
				((k - hidden_at) / span).clamp(0.0, 1.0)
			}
		}
	}
}

/// Zoom rules for every scaled detail of the view.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	pub node_label: ZoomRule,
	pub edge_label: ZoomRule,
	/// Edge labels disappear when the whole graph is zoomed far out.
	pub edge_label_fade: ZoomFade,
	pub edge_width: ZoomRule,
	/// Arrowhead length in world units, multiplied by the edge `arrow_scale`.
	pub arrow_length: f64,
	pub arrow: ZoomRule,
	/// Extra hit area around each node, in screen pixels.
	pub hit_padding_px: f64,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node_label: ZoomRule::Bounded {
				min_px: 7.0,
				max_px: 24.0,
			},
			edge_label: ZoomRule::Bounded {
				min_px: 6.0,
				max_px: 16.0,
			},
			edge_label_fade: ZoomFade::Between {
				hidden_at: 0.35,
				visible_at: 0.7,
			},
			edge_width: ZoomRule::Bounded {
				min_px: 1.0,
				max_px: f64::INFINITY,
			},
			arrow_length: 6.0,
			arrow: ZoomRule::Bounded {
				min_px: 3.0,
				max_px: 18.0,
			},
			hit_padding_px: 6.0,
		}
	}
}

/// [`ScaleConfig`] evaluated at one zoom factor. Built once per frame.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	pub k: f64,
	/// Hit padding around nodes, in world units.
	pub hit_padding: f64,
	/// Edge label opacity in `[0, 1]`.
	pub edge_label_alpha: f64,
	config: ScaleConfig,
}

impl ScaledValues {
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let k = if k > 0.0 && k.is_finite() { k } else { 1.0 };
		Self {
			k,
			hit_padding: ZoomRule::Pixels.apply(config.hit_padding_px, k),
			edge_label_alpha: config.edge_label_fade.alpha(k),
			config: config.clone(),
		}
	}

	pub fn node_font(&self, base: f64) -> f64 {
		self.config.node_label.apply(base, self.k)
	}

	pub fn edge_font(&self, base: f64) -> f64 {
		self.config.edge_label.apply(base, self.k)
	}

	pub fn edge_width(&self, base: f64) -> f64 {
		self.config.edge_width.apply(base, self.k)
	}

	pub fn arrow_size(&self, arrow_scale: f64) -> f64 {
		self.config
			.arrow
			.apply(self.config.arrow_length * arrow_scale, self.k)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_zoom_rules() {
		assert_eq!(ZoomRule::Scales.apply(10.0, 2.0), 10.0);
		assert_eq!(ZoomRule::Pixels.apply(10.0, 2.0), 5.0);

		let bounded = ZoomRule::Bounded {
			min_px: 7.0,
			max_px: 20.0,
		};
		// 10 units at k=0.5 is 5px: raised to 7px.
		assert_eq!(bounded.apply(10.0, 0.5), 14.0);
		// 40px at k=4: capped to 20px.
		assert_eq!(bounded.apply(10.0, 4.0), 5.0);
		assert_eq!(bounded.apply(10.0, 1.0), 10.0);
	}

	#[test]
	fn test_fade() {
		let fade = ZoomFade::Between {
			hidden_at: 0.4,
			visible_at: 0.8,
		};
		assert_eq!(fade.alpha(0.2), 0.0);
		assert_eq!(fade.alpha(1.0), 1.0);
		assert!((fade.alpha(0.6) - 0.5).abs() < 1e-9);
		assert_eq!(ZoomFade::Never.alpha(0.01), 1.0);
	}

	#[test]
	fn test_degenerate_zoom_is_treated_as_identity() {
		for k in [0.0, -1.0, f64::NAN] {
			let values = ScaledValues::new(&ScaleConfig::default(), k);
			assert_eq!(values.k, 1.0);
			assert_eq!(values.hit_padding, 6.0);
		}
	}

	#[test]
	fn test_labels_stay_legible_when_zoomed_out() {
		let far = ScaledValues::new(&ScaleConfig::default(), 0.25);
		// 10-unit font would be 2.5px; drawn at 7px instead.
		assert_eq!(far.node_font(10.0) * far.k, 7.0);
		assert_eq!(far.edge_label_alpha, 0.0);
		assert_eq!(far.hit_padding, 24.0);
	}
}
