//! Canvas rendering for the graph view.
//!
//! Draws in three passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Edges: ghost line, line, arrowhead, label (world space)
//! 3. Nodes in [`GraphViewState::draw_order`], hovered and selected on top

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::model::Edge;
use super::scale::{ScaleConfig, ScaledValues};
use super::state::GraphViewState;
use super::style::{self, NodeStyle};
use super::theme::{Color, NodeShape, Theme};
use super::types::Point;

/// Renders the complete graph to the canvas.
pub fn render(
	state: &GraphViewState,
	ctx: &CanvasRenderingContext2d,
	config: &ScaleConfig,
	theme: &Theme,
) {
	let size = state.viewport.size();
	if !size.is_measured() {
		return;
	}
	let transform = state.viewport.transform();
	let scale = ScaledValues::new(config, transform.k);

	draw_background(ctx, theme, size.width, size.height);

	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);

	let styles: Vec<NodeStyle> = (0..state.positions().len())
		.map(|i| state.node_style(i, theme))
		.collect();

	for edge in state.graph().edges() {
		draw_edge(state, ctx, &scale, theme, &styles, edge);
	}
	for idx in state.draw_order() {
		draw_node(state, ctx, &scale, theme, &styles[idx], idx);
	}

	ctx.restore();
}

fn draw_background(ctx: &CanvasRenderingContext2d, theme: &Theme, width: f64, height: f64) {
	let background = &theme.background;
	let gradient = background
		.use_gradient
		.then(|| {
			ctx.create_radial_gradient(
				width / 2.0,
				height / 2.0,
				0.0,
				width / 2.0,
				height / 2.0,
				width.max(height) * 0.8,
			)
			.ok()
		})
		.flatten();

	match gradient {
		Some(gradient) => {
			let _ = gradient.add_color_stop(0.0, &background.color_secondary.to_css());
			let _ = gradient.add_color_stop(1.0, &background.color.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&background.color.to_css()),
	}

	ctx.fill_rect(0.0, 0.0, width, height);
}

fn draw_edge(
	state: &GraphViewState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	styles: &[NodeStyle],
	edge: &Edge,
) {
	let positions = state.positions();
	let (Some(&from), Some(&to)) = (positions.get(edge.source), positions.get(edge.target)) else {
		return;
	};
	let edge_style = style::resolve_edge(theme, state.edge_highlighted(edge));
	let width = scale.edge_width(edge_style.width);

	if edge.source == edge.target {
		draw_self_loop(ctx, from, styles[edge.source].radius(), &edge_style.line_color, width);
		return;
	}

	let delta = to - from;
	let dist = delta.length();
	let start_r = styles[edge.source].radius();
	let end_r = styles[edge.target].radius();
	if dist <= start_r + end_r {
		return;
	}
	let (ux, uy) = (delta.x / dist, delta.y / dist);
	let arrow = scale.arrow_size(edge_style.arrow_scale);

	let start = Point::new(from.x + ux * start_r, from.y + uy * start_r);
	let tip = Point::new(to.x - ux * end_r, to.y - uy * end_r);
	let back = Point::new(tip.x - ux * arrow, tip.y - uy * arrow);

	if edge_style.ghost_opacity > 0.0 {
		let (gx, gy) = theme.edge.ghost_offset;
		ctx.set_stroke_style_str(&edge_style.line_color.with_alpha(edge_style.ghost_opacity).to_css());
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(start.x + gx, start.y + gy);
		ctx.line_to(back.x + gx, back.y + gy);
		ctx.stroke();
	}

	ctx.set_stroke_style_str(&edge_style.line_color.to_css());
	ctx.set_line_width(width);
	ctx.begin_path();
	ctx.move_to(start.x, start.y);
	ctx.line_to(back.x, back.y);
	ctx.stroke();

	let (px, py) = (-uy * arrow * 0.5, ux * arrow * 0.5);
	ctx.set_fill_style_str(&edge_style.line_color.to_css());
	ctx.begin_path();
	ctx.move_to(tip.x, tip.y);
	ctx.line_to(back.x + px, back.y + py);
	ctx.line_to(back.x - px, back.y - py);
	ctx.close_path();
	ctx.fill();

	if let Some(label) = &edge.label {
		if scale.edge_label_alpha > 0.01 {
			let mid = Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
			let mut angle = uy.atan2(ux);
			// Keep text upright.
			if angle > PI / 2.0 || angle < -PI / 2.0 {
				angle += PI;
			}
			let font = scale.edge_font(edge_style.font_size);

			ctx.save();
			let _ = ctx.translate(mid.x, mid.y);
			let _ = ctx.rotate(angle);
			ctx.set_global_alpha(scale.edge_label_alpha);
			ctx.set_font(&format!("{}px {}", font, theme.node.font_family));
			ctx.set_text_align("center");
			ctx.set_text_baseline("bottom");
			ctx.set_fill_style_str(&edge_style.label_color.to_css());
			let _ = ctx.fill_text(label, 0.0, -width);
			ctx.restore();
		}
	}
}

fn draw_self_loop(
	ctx: &CanvasRenderingContext2d,
	at: Point,
	radius: f64,
	color: &Color,
	width: f64,
) {
	let loop_r = radius * 0.6;
	ctx.set_stroke_style_str(&color.to_css());
	ctx.set_line_width(width);
	ctx.begin_path();
	let _ = ctx.arc(at.x, at.y - radius, loop_r, 0.0, 2.0 * PI);
	ctx.stroke();
}

fn draw_node(
	state: &GraphViewState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	node_style: &NodeStyle,
	idx: usize,
) {
	let Some(&at) = state.positions().get(idx) else {
		return;
	};
	let radius = node_style.radius();

	let shaded = theme
		.node
		.use_gradient
		.then(|| {
			ctx.create_radial_gradient(
				at.x - radius * 0.3,
				at.y - radius * 0.3,
				0.0,
				at.x,
				at.y,
				radius * 1.2,
			)
			.ok()
		})
		.flatten();

	trace_shape(ctx, node_style.shape, at, radius);
	match shaded {
		Some(gradient) => {
			let fill = node_style.fill;
			let _ = gradient.add_color_stop(0.0, &fill.lighten(0.25).to_css());
			let _ = gradient.add_color_stop(0.7, &fill.to_css());
			let _ = gradient.add_color_stop(1.0, &fill.darken(0.15).to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&node_style.fill.to_css()),
	}
	ctx.fill();

	if node_style.border_width > 0.0 {
		ctx.set_stroke_style_str(&node_style.border_color.to_css());
		ctx.set_line_width(node_style.border_width);
		ctx.stroke();
	}

	let label = &state.graph().nodes()[idx].label;
	let font = scale.node_font(node_style.font_size);
	ctx.set_font(&format!("bold {}px {}", font, theme.node.font_family));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(&node_style.label_color.to_css());
	let _ = ctx.fill_text(label, at.x, at.y);
}

/// Begin a path outlining `shape` centred on `at`.
fn trace_shape(ctx: &CanvasRenderingContext2d, shape: NodeShape, at: Point, radius: f64) {
	ctx.begin_path();
	match shape {
		NodeShape::Ellipse => {
			let _ = ctx.arc(at.x, at.y, radius, 0.0, 2.0 * PI);
		}
		NodeShape::RoundRectangle => {
			let r = radius;
			let corner = r * 0.5;
			ctx.move_to(at.x - r + corner, at.y - r);
			let _ = ctx.arc_to(at.x + r, at.y - r, at.x + r, at.y + r, corner);
			let _ = ctx.arc_to(at.x + r, at.y + r, at.x - r, at.y + r, corner);
			let _ = ctx.arc_to(at.x - r, at.y + r, at.x - r, at.y - r, corner);
			let _ = ctx.arc_to(at.x - r, at.y - r, at.x + r, at.y - r, corner);
			ctx.close_path();
		}
		NodeShape::Diamond | NodeShape::Tag => {
			let points = style::polygon(shape, radius).unwrap_or_default();
			for (i, (px, py)) in points.into_iter().enumerate() {
				if i == 0 {
					ctx.move_to(at.x + px, at.y + py);
				} else {
					ctx.line_to(at.x + px, at.y + py);
				}
			}
			ctx.close_path();
		}
	}
}
