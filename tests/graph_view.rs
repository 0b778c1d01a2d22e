//! End-to-end behavior of a graph view outside the browser: load data, run
//! the layout frame by frame, fit it and click a node.

use entity_graph::components::graph_view::layout::LayoutPhase;
use entity_graph::components::graph_view::scale::{ScaleConfig, ScaledValues};
use entity_graph::{
	Graph, GraphData, GraphViewState, LayoutEngine, LayoutParams, NodeDetails, RawEdge, RawNode,
	Theme,
};

fn chain_with_dangling_edge() -> GraphData {
	GraphData {
		nodes: vec![
			RawNode::new("A").with_kind("Person"),
			RawNode::new("B"),
			RawNode::new("C").with_kind("Company"),
		],
		edges: vec![
			RawEdge::new("A", "B").with_label("knows"),
			RawEdge::new("B", "C"),
			RawEdge::new("C", "Z"),
		],
	}
}

fn run_to_convergence(state: &mut GraphViewState) -> usize {
	let mut frames = 0;
	while state.layout_phase() != LayoutPhase::Converged && frames < 1000 {
		state.tick(1.0 / 60.0);
		frames += 1;
	}
	state.tick(1.0 / 60.0);
	frames
}

#[test]
fn test_load_layout_fit_and_click() {
	let params = LayoutParams::default();
	let mut state = GraphViewState::new(params.clone());
	state.observe_size(800.0, 600.0);

	let generation = state.replace_data(&chain_with_dangling_edge()).unwrap();
	assert_eq!(generation, 1);
	assert_eq!(state.graph().len(), 3);
	assert_eq!(state.graph().edges().len(), 2);
	assert_eq!(state.graph().dropped_edges(), 1);

	let frames = run_to_convergence(&mut state);
	assert_eq!(state.layout_phase(), LayoutPhase::Converged);
	assert!(frames * params.refresh <= params.num_iter + params.refresh);
	assert!(state.positions().iter().all(|p| p.is_finite()));

	let transform = state.viewport.transform();
	for p in state.positions() {
		let s = transform.to_screen(*p);
		assert!((60.0 - 1e-6..=740.0 + 1e-6).contains(&s.x), "x {}", s.x);
		assert!((60.0 - 1e-6..=540.0 + 1e-6).contains(&s.y), "y {}", s.y);
	}

	let theme = Theme::default();
	let scale = ScaledValues::new(&ScaleConfig::default(), transform.k);
	let b = transform.to_screen(state.positions()[1]);
	let details = state.click(b.x, b.y, &theme, &scale);
	assert_eq!(
		details,
		Some(NodeDetails {
			id: "B".to_string(),
			kind: None,
			label: "B".to_string(),
			description: None,
		})
	);
	assert_eq!(state.interaction.selected(), Some("B"));
}

#[test]
fn test_layout_is_deterministic() {
	let data = chain_with_dangling_edge();
	let graph = Graph::from_data(&data).unwrap();

	let first = LayoutEngine::new(&graph, LayoutParams::default(), 1).run();
	let second = LayoutEngine::new(&graph, LayoutParams::default(), 1).run();
	assert!(first.converged);
	assert_eq!(first.positions, second.positions);
	assert!(first.iteration <= LayoutParams::default().num_iter);
}

#[test]
fn test_empty_graph_draws_nothing_and_keeps_transform() {
	let mut state = GraphViewState::new(LayoutParams::default());
	state.observe_size(800.0, 600.0);
	state.replace_data(&GraphData::default()).unwrap();

	let before = state.viewport.transform();
	let update = state.tick(1.0 / 60.0);
	assert!(!update.refit);
	assert_eq!(state.viewport.transform(), before);
	assert_eq!(state.layout_phase(), LayoutPhase::Converged);
	assert!(state.positions().is_empty());
}
