//! Per-surface view state.
//!
//! Combines the current graph generation, its layout run, the viewport and
//! the interaction slots. The animation loop calls [`GraphViewState::tick`]
//! once per frame; pointer handlers call the `pointer_*` methods with canvas
//! coordinates.
//!
//! Positions are only ever written through [`GraphViewState::apply_frame`],
//! which rejects frames from any generation but the current one.

use std::collections::HashMap;

use log::{debug, error, info};

use super::interaction::{Cursor, InteractionController};
use super::layout::{LayoutEngine, LayoutFrame, LayoutParams, LayoutPhase};
use super::model::{Edge, Graph, InvalidGraphError, NodeDetails};
use super::scale::ScaledValues;
use super::style::{self, NodeStyle, StyleFlags};
use super::theme::Theme;
use super::types::{GraphData, Point};
use super::viewport::{Bounds, FrameUpdate, Size, ViewportManager};

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	/// Whether the pointer moved far enough to count as a drag, not a click.
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub last_x: f64,
	pub last_y: f64,
}

/// Pointer travel (pixels) below which a press-release counts as a click.
const CLICK_SLOP: f64 = 4.0;

impl PanState {
	pub fn begin(&mut self, x: f64, y: f64) {
		*self = PanState {
			active: true,
			moved: false,
			start_x: x,
			start_y: y,
			last_x: x,
			last_y: y,
		};
	}

	/// Advance to `(x, y)` and return the delta since the last update.
	pub fn update(&mut self, x: f64, y: f64) -> (f64, f64) {
		let delta = (x - self.last_x, y - self.last_y);
		self.last_x = x;
		self.last_y = y;
		if (x - self.start_x).hypot(y - self.start_y) > CLICK_SLOP {
			self.moved = true;
		}
		delta
	}

	pub fn end(&mut self) {
		self.active = false;
	}
}

/// Smoothed hover intensity per node, driving the hover size animation.
///
/// Uses exponential smoothing for natural-feeling transitions that slow down
/// as they approach their target.
#[derive(Clone, Debug, Default)]
pub struct HoverTween {
	target: Option<usize>,
	intensity: HashMap<usize, f64>,
}

/// Fade speed: reaches ~95% of the target in ~200ms.
const HOVER_SPEED: f64 = 15.0;

impl HoverTween {
	pub fn set_target(&mut self, node: Option<usize>) {
		self.target = node;
	}

	/// Animate all intensities towards their targets.
	pub fn tick(&mut self, dt: f64) {
		let factor = 1.0 - (-HOVER_SPEED * dt.max(0.0)).exp();
		if let Some(idx) = self.target {
			self.intensity.entry(idx).or_insert(0.0);
		}
		let target = self.target;
		self.intensity.retain(|idx, value| {
			let goal = if Some(*idx) == target { 1.0 } else { 0.0 };
			*value += (goal - *value) * factor;
			Some(*idx) == target || *value > 0.005
		});
	}

	pub fn intensity(&self, idx: usize) -> f64 {
		self.intensity.get(&idx).copied().unwrap_or(0.0)
	}

	pub fn clear(&mut self) {
		self.target = None;
		self.intensity.clear();
	}
}

/// Pairwise force evaluations allowed in one animation frame.
const FRAME_PAIR_BUDGET: usize = 400_000;

/// Layout iterations to run in one frame for a graph of `n` nodes: `refresh`,
/// reduced so large graphs stay within [`FRAME_PAIR_BUDGET`], and at least one.
fn iterations_per_frame(refresh: usize, n: usize) -> usize {
	let pairs_per_iteration = (n * n.saturating_sub(1) / 2).max(1);
	refresh
		.min(FRAME_PAIR_BUDGET / pairs_per_iteration)
		.max(1)
}

/// Everything one mounted graph view needs between frames.
pub struct GraphViewState {
	graph: Graph,
	generation: u64,
	params: LayoutParams,
	layout: LayoutEngine,
	positions: Vec<Point>,
	positions_dirty: bool,
	pub viewport: ViewportManager,
	pub interaction: InteractionController,
	pub hover: HoverTween,
	pub pan: PanState,
}

impl GraphViewState {
	/// An empty view. Load data with [`replace_data`](Self::replace_data).
	pub fn new(params: LayoutParams) -> Self {
		let graph = Graph::default();
		Self {
			layout: LayoutEngine::new(&graph, params.clone(), 0),
			viewport: ViewportManager::new(params.padding, params.max_zoom),
			graph,
			generation: 0,
			params,
			positions: Vec::new(),
			positions_dirty: false,
			interaction: InteractionController::new(),
			hover: HoverTween::default(),
			pan: PanState::default(),
		}
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn positions(&self) -> &[Point] {
		&self.positions
	}

	pub fn layout_phase(&self) -> LayoutPhase {
		self.layout.phase()
	}

	/// Start a new generation from `data`.
	///
	/// The previous layout and positions are discarded and hover/selection
	/// reset. On error the view is left empty so nothing stale is drawn.
	pub fn replace_data(&mut self, data: &GraphData) -> Result<u64, InvalidGraphError> {
		self.generation += 1;
		self.interaction.reset();
		self.hover.clear();
		self.pan.end();

		let result = Graph::from_data(data);
		self.graph = match &result {
			Ok(graph) => graph.clone(),
			Err(e) => {
				error!("graph view: rejecting data set: {}", e);
				Graph::default()
			}
		};
		self.layout = LayoutEngine::new(&self.graph, self.params.clone(), self.generation);
		self.positions = self.layout.frame().positions;
		self.positions_dirty = true;
		self.viewport.request_fit();

		info!(
			"graph view: generation {} with {} nodes, {} edges ({} dropped)",
			self.generation,
			self.graph.len(),
			self.graph.edges().len(),
			self.graph.dropped_edges()
		);
		result.map(|_| self.generation)
	}

	/// Accept positions from a layout run if they belong to the current
	/// generation.
	pub fn apply_frame(&mut self, frame: LayoutFrame) -> bool {
		if frame.generation != self.generation || frame.positions.len() != self.graph.len() {
			debug!(
				"graph view: ignoring layout frame for generation {} (current {})",
				frame.generation, self.generation
			);
			return false;
		}
		self.positions = frame.positions;
		self.positions_dirty = true;
		true
	}

	/// Advance one animation frame of `dt` seconds.
	pub fn tick(&mut self, dt: f64) -> FrameUpdate {
		if !self.layout.is_converged() {
			let frame = self
				.layout
				.step(iterations_per_frame(self.params.refresh, self.graph.len()));
			self.apply_frame(frame);
		}
		self.hover.tick(dt);

		let bounds = Bounds::from_points(&self.positions);
		let moved = std::mem::take(&mut self.positions_dirty);
		self.viewport.on_frame(bounds, moved)
	}

	/// Record a container measurement, applied on the next tick.
	pub fn observe_size(&mut self, width: f64, height: f64) {
		self.viewport.observe_size(Size::new(width, height));
	}

	/// Resolved style of node `idx`, including the animated hover size.
	pub fn node_style(&self, idx: usize, theme: &Theme) -> NodeStyle {
		let node = &self.graph.nodes()[idx];
		let flags = self.interaction.flags(&node.id);
		let resting = style::resolve_node(
			theme,
			node.type_name(),
			StyleFlags {
				hovered: false,
				..flags
			},
		);
		let t = self.hover.intensity(idx);
		if t <= 0.0 {
			return resting;
		}
		let hovered = style::resolve_node(
			theme,
			node.type_name(),
			StyleFlags {
				hovered: true,
				..flags
			},
		);
		resting.lerp(&hovered, t)
	}

	/// Whether an edge touches the hovered or selected node.
	pub fn edge_highlighted(&self, edge: &Edge) -> bool {
		let nodes = self.graph.nodes();
		[edge.source, edge.target].iter().any(|&i| {
			let flags = self.interaction.flags(&nodes[i].id);
			flags.hovered || flags.selected
		})
	}

	/// Node indices in paint order: plain nodes, then the selected node, then
	/// the hovered node on top.
	pub fn draw_order(&self) -> Vec<usize> {
		let active = |i: usize| {
			let flags = self.interaction.flags(&self.graph.nodes()[i].id);
			(flags.hovered, flags.selected)
		};
		let mut order: Vec<usize> = (0..self.positions.len()).collect();
		order.sort_by_key(|&i| active(i));
		order
	}

	/// Topmost node under the canvas point `(sx, sy)`.
	pub fn node_at_position(
		&self,
		sx: f64,
		sy: f64,
		theme: &Theme,
		scale: &ScaledValues,
	) -> Option<usize> {
		let p = self.viewport.transform().to_world(sx, sy);
		self.draw_order().into_iter().rev().find(|&i| {
			let radius = self.node_style(i, theme).radius() + scale.hit_padding;
			(self.positions[i] - p).length() <= radius
		})
	}

	fn hit_id(&self, sx: f64, sy: f64, theme: &Theme, scale: &ScaledValues) -> Option<String> {
		self.node_at_position(sx, sy, theme, scale)
			.map(|i| self.graph.nodes()[i].id.clone())
	}

	/// Pointer moved to `(sx, sy)`. Returns whether the hover changed.
	pub fn pointer_move(&mut self, sx: f64, sy: f64, theme: &Theme, scale: &ScaledValues) -> bool {
		let hit = self.hit_id(sx, sy, theme, scale);
		let changed = self.interaction.pointer_move(hit.as_deref(), &self.graph);
		if changed {
			let idx = self
				.interaction
				.hovered()
				.and_then(|id| self.graph.index_of(id));
			self.hover.set_target(idx);
		}
		changed
	}

	pub fn pointer_leave(&mut self) {
		if self.interaction.pointer_leave() {
			self.hover.set_target(None);
		}
		self.pan.end();
	}

	/// Click or tap at `(sx, sy)`. Returns the host payload when a node was
	/// selected.
	pub fn click(
		&mut self,
		sx: f64,
		sy: f64,
		theme: &Theme,
		scale: &ScaledValues,
	) -> Option<NodeDetails> {
		let hit = self.hit_id(sx, sy, theme, scale);
		self.interaction.click(hit.as_deref(), &self.graph)
	}

	/// Host-driven selection. `None` clears it.
	pub fn set_selected(&mut self, id: Option<&str>) {
		match id {
			Some(id) => {
				if !self.interaction.select_by_id(id, &self.graph) {
					debug!("graph view: cannot select unknown node {}", id);
				}
			}
			None => self.interaction.clear_selection(),
		}
	}

	pub fn cursor(&self) -> Cursor {
		self.interaction.cursor(self.pan.active && self.pan.moved)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::scale::ScaleConfig;
	use crate::components::graph_view::types::{RawEdge, RawNode};

	fn data(ids: &[&str], edges: &[(&str, &str)]) -> GraphData {
		GraphData {
			nodes: ids.iter().map(|&id| RawNode::new(id)).collect(),
			edges: edges.iter().map(|&(s, t)| RawEdge::new(s, t)).collect(),
		}
	}

	fn settle(state: &mut GraphViewState) {
		for _ in 0..200 {
			state.tick(1.0 / 60.0);
			if state.layout_phase() == LayoutPhase::Converged {
				break;
			}
		}
		state.tick(1.0 / 60.0);
	}

	fn screen_of(state: &GraphViewState, idx: usize) -> Point {
		state.viewport.transform().to_screen(state.positions()[idx])
	}

	#[test]
	fn test_hover_tween_converges_and_fades() {
		let mut tween = HoverTween::default();
		tween.set_target(Some(3));
		for _ in 0..30 {
			tween.tick(1.0 / 60.0);
		}
		assert!(tween.intensity(3) > 0.95);

		tween.set_target(None);
		for _ in 0..120 {
			tween.tick(1.0 / 60.0);
		}
		assert_eq!(tween.intensity(3), 0.0);
	}

	#[test]
	fn test_pan_distinguishes_drag_from_click() {
		let mut pan = PanState::default();
		pan.begin(10.0, 10.0);
		assert_eq!(pan.update(12.0, 11.0), (2.0, 1.0));
		assert!(!pan.moved);
		pan.update(30.0, 10.0);
		assert!(pan.moved);
	}

	#[test]
	fn test_stale_frames_are_rejected() {
		let mut state = GraphViewState::new(LayoutParams::default());
		state.replace_data(&data(&["A", "B"], &[("A", "B")])).unwrap();
		let old = LayoutEngine::new(state.graph(), LayoutParams::default(), state.generation()).run();

		state.replace_data(&data(&["A", "B"], &[])).unwrap();
		let before = state.positions().to_vec();
		assert!(!state.apply_frame(old.clone()));
		assert_eq!(state.positions(), before.as_slice());

		let current = LayoutFrame {
			generation: state.generation(),
			..old
		};
		assert!(state.apply_frame(current));
	}

	#[test]
	fn test_invalid_data_leaves_view_empty() {
		let mut state = GraphViewState::new(LayoutParams::default());
		state.replace_data(&data(&["A", "B"], &[])).unwrap();

		let err = state.replace_data(&data(&["A", "A"], &[])).unwrap_err();
		assert_eq!(err, InvalidGraphError::DuplicateNodeId { id: "A".into() });
		assert!(state.graph().is_empty());
		assert!(state.positions().is_empty());
	}

	#[test]
	fn test_layout_runs_in_chunks_then_fits() {
		let params = LayoutParams {
			refresh: 5,
			..LayoutParams::default()
		};
		let mut state = GraphViewState::new(params.clone());
		state.replace_data(&data(&["A", "B", "C"], &[("A", "B"), ("B", "C")])).unwrap();
		state.observe_size(800.0, 600.0);

		state.tick(0.016);
		assert_eq!(state.layout_phase(), LayoutPhase::Iterating);

		settle(&mut state);
		assert_eq!(state.layout_phase(), LayoutPhase::Converged);
		let expected = LayoutEngine::new(state.graph(), params, state.generation()).run();
		assert_eq!(state.positions(), expected.positions.as_slice());

		for i in 0..3 {
			let s = screen_of(&state, i);
			assert!(s.x >= 60.0 - 1e-9 && s.x <= 740.0 + 1e-9);
			assert!(s.y >= 60.0 - 1e-9 && s.y <= 540.0 + 1e-9);
		}
	}

	#[test]
	fn test_pointer_hover_and_click() {
		let theme = Theme::default();
		let scale = ScaledValues::new(&ScaleConfig::default(), 1.0);
		let mut state = GraphViewState::new(LayoutParams::default());
		state.replace_data(&data(&["A", "B"], &[("A", "B")])).unwrap();
		state.observe_size(800.0, 600.0);
		settle(&mut state);

		let b = screen_of(&state, 1);
		assert!(state.pointer_move(b.x, b.y, &theme, &scale));
		assert_eq!(state.interaction.hovered(), Some("B"));
		assert_eq!(state.cursor(), Cursor::Pointer);

		let details = state.click(b.x, b.y, &theme, &scale).unwrap();
		assert_eq!(details.id, "B");
		assert_eq!(state.interaction.selected(), Some("B"));
		assert!(state.edge_highlighted(&state.graph().edges()[0]));

		// Far corner: empty space keeps the selection.
		assert_eq!(state.click(1.0, 1.0, &theme, &scale), None);
		assert_eq!(state.interaction.selected(), Some("B"));

		state.pointer_leave();
		assert_eq!(state.interaction.hovered(), None);
	}

	#[test]
	fn test_new_generation_resets_selection_until_reselected() {
		let mut state = GraphViewState::new(LayoutParams::default());
		state.replace_data(&data(&["A", "B"], &[])).unwrap();
		state.set_selected(Some("A"));
		assert_eq!(state.interaction.selected(), Some("A"));

		let generation = state.replace_data(&data(&["A", "C"], &[])).unwrap();
		assert_eq!(generation, 2);
		assert_eq!(state.interaction.selected(), None);

		state.set_selected(Some("B"));
		assert_eq!(state.interaction.selected(), None);
		state.set_selected(Some("A"));
		assert_eq!(state.interaction.selected(), Some("A"));
		state.set_selected(None);
		assert_eq!(state.interaction.selected(), None);
	}

	#[test]
	fn test_frame_work_shrinks_for_large_graphs() {
		assert_eq!(iterations_per_frame(20, 0), 20);
		assert_eq!(iterations_per_frame(20, 50), 20);
		// 1000 nodes: ~500k pairs per iteration, so one iteration per frame.
		assert_eq!(iterations_per_frame(20, 1000), 1);
		// 300 nodes: 44850 pairs, 8 iterations fit the budget.
		assert_eq!(iterations_per_frame(20, 300), 8);
		assert_eq!(iterations_per_frame(0, 3), 1);
	}

	#[test]
	fn test_draw_order_puts_active_nodes_last() {
		let mut state = GraphViewState::new(LayoutParams::default());
		state.replace_data(&data(&["A", "B", "C", "D"], &[])).unwrap();
		assert_eq!(state.draw_order(), vec![0, 1, 2, 3]);

		state.set_selected(Some("A"));
		let graph = state.graph().clone();
		state.interaction.pointer_move(Some("B"), &graph);
		assert_eq!(state.draw_order(), vec![2, 3, 0, 1]);
	}

	#[test]
	fn test_hovered_style_animates_size() {
		let theme = Theme::default();
		let mut state = GraphViewState::new(LayoutParams::default());
		state.replace_data(&data(&["A"], &[])).unwrap();
		assert_eq!(state.node_style(0, &theme).size, 50.0);

		state.hover.set_target(Some(0));
		state.tick(0.05);
		let mid = state.node_style(0, &theme).size;
		assert!(mid > 50.0 && mid < 60.0);
	}
}
