//! Force-directed layout with simulated-annealing cooling.
//!
//! Every node repels every other node, edges act as springs toward an ideal
//! length, and a soft gravity keeps disconnected pieces from drifting apart.
//! Displacement per iteration is bounded by a temperature that cools
//! geometrically, so the run always terminates:
//!
//! ```text
//! Initializing --step--> Iterating --(temperature < min_temp | iteration cap)--> Converged
//! ```
//!
//! The engine is stepped in chunks so a host can spread a run across
//! animation frames. With randomization disabled the output is bit-identical
//! for identical input.

use std::collections::BTreeMap;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use super::model::Graph;
use super::types::Point;

/// Golden angle in radians, used for the default spiral placement.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Spring force per unit of stretch is this divided by `edge_elasticity`.
const SPRING_STIFFNESS: f64 = 50.0;

/// Distances are floored to this to keep inverse-square forces finite.
const MIN_DISTANCE: f64 = 1.0;

/// Named numeric layout and fit parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutParams {
	/// Rest length of edge springs.
	pub ideal_edge_length: f64,
	/// Pairwise repulsion constant (force = node_repulsion / d²).
	pub node_repulsion: f64,
	/// Spring softness; the spring force is `(d - ideal_edge_length) * 50 / edge_elasticity`.
	pub edge_elasticity: f64,
	/// Pull toward the centroid.
	pub gravity: f64,
	/// Extra separation between disconnected components.
	pub component_spacing: f64,
	/// Starting temperature: the largest displacement in a single iteration.
	pub initial_temp: f64,
	/// Temperature multiplier per iteration (< 1).
	pub cooling_factor: f64,
	/// Temperature below which the run is converged.
	pub min_temp: f64,
	/// Hard iteration cap.
	pub num_iter: usize,
	/// Iterations run per animation frame.
	pub refresh: usize,
	/// Velocity retained between iterations.
	pub damping: f64,
	/// Screen padding around the fitted layout, in pixels.
	pub padding: f64,
	/// Largest zoom a fit may choose.
	pub max_zoom: f64,
	/// Start from random positions instead of the deterministic spiral.
	pub randomize: bool,
	/// Seed for randomized starts.
	pub seed: u64,
}

impl Default for LayoutParams {
	fn default() -> Self {
		Self {
			ideal_edge_length: 140.0,
			node_repulsion: 450_000.0,
			edge_elasticity: 100.0,
			gravity: 80.0,
			component_spacing: 100.0,
			initial_temp: 200.0,
			cooling_factor: 0.95,
			min_temp: 1.0,
			num_iter: 1000,
			refresh: 20,
			damping: 0.6,
			padding: 60.0,
			max_zoom: 2.0,
			randomize: false,
			seed: 0,
		}
	}
}

/// Phase of a layout run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutPhase {
	Initializing,
	Iterating,
	Converged,
}

/// Positions produced by a layout run, aligned with the graph's node order.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutFrame {
	/// Generation of the graph these positions belong to.
	pub generation: u64,
	/// Iterations completed when the frame was taken.
	pub iteration: usize,
	pub converged: bool,
	pub positions: Vec<Point>,
}

impl LayoutFrame {
	/// Positions keyed by node id.
	pub fn to_map(&self, graph: &Graph) -> BTreeMap<String, Point> {
		graph
			.nodes()
			.iter()
			.zip(&self.positions)
			.map(|(node, &p)| (node.id.clone(), p))
			.collect()
	}
}

/// One layout run over a single graph generation.
#[derive(Clone, Debug)]
pub struct LayoutEngine {
	params: LayoutParams,
	generation: u64,
	phase: LayoutPhase,
	positions: Vec<Point>,
	velocities: Vec<Point>,
	edges: Vec<(usize, usize)>,
	component: Vec<usize>,
	temperature: f64,
	iteration: usize,
}

impl LayoutEngine {
	pub fn new(graph: &Graph, params: LayoutParams, generation: u64) -> Self {
		let n = graph.len();
		Self {
			positions: initial_positions(graph, &params),
			velocities: vec![Point::ORIGIN; n],
			edges: graph.edges().iter().map(|e| (e.source, e.target)).collect(),
			component: (0..n).map(|i| graph.component_of(i)).collect(),
			temperature: params.initial_temp,
			iteration: 0,
			phase: LayoutPhase::Initializing,
			params,
			generation,
		}
	}

	pub fn phase(&self) -> LayoutPhase {
		self.phase
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn is_converged(&self) -> bool {
		self.phase == LayoutPhase::Converged
	}

	pub fn iteration(&self) -> usize {
		self.iteration
	}

	pub fn temperature(&self) -> f64 {
		self.temperature
	}

	pub fn params(&self) -> &LayoutParams {
		&self.params
	}

	/// Run at most `max_iterations` iterations and return the resulting frame.
	pub fn step(&mut self, max_iterations: usize) -> LayoutFrame {
		if self.phase == LayoutPhase::Initializing {
			self.phase = LayoutPhase::Iterating;
			if self.positions.len() <= 1 {
				// Nothing to balance; a lone node stays at its start.
				self.converge();
			}
		}

		for _ in 0..max_iterations {
			if self.phase == LayoutPhase::Converged {
				break;
			}
			if self.iteration >= self.params.num_iter || self.temperature < self.params.min_temp {
				self.converge();
				break;
			}
			self.iterate();
		}

		if self.phase == LayoutPhase::Iterating
			&& (self.iteration >= self.params.num_iter || self.temperature < self.params.min_temp)
		{
			self.converge();
		}

		self.frame()
	}

	/// Run to convergence. Terminates by the iteration cap at the latest.
	pub fn run(&mut self) -> LayoutFrame {
		let remaining = self.params.num_iter.saturating_sub(self.iteration) + 1;
		self.step(remaining)
	}

	pub fn frame(&self) -> LayoutFrame {
		LayoutFrame {
			generation: self.generation,
			iteration: self.iteration,
			converged: self.is_converged(),
			positions: self.positions.clone(),
		}
	}

	fn converge(&mut self) {
		self.phase = LayoutPhase::Converged;
		debug!(
			"layout: generation {} converged after {} iterations (temperature {:.3})",
			self.generation, self.iteration, self.temperature
		);
	}

	fn iterate(&mut self) {
		let forces = self.forces();
		let p = &self.params;
		let step = if p.initial_temp > 0.0 {
			self.temperature / p.initial_temp
		} else {
			0.0
		};
		let max_disp = self.temperature.min(p.initial_temp).max(0.0);

		for ((pos, vel), force) in self
			.positions
			.iter_mut()
			.zip(self.velocities.iter_mut())
			.zip(forces)
		{
			if !force.is_finite() {
				*vel = Point::ORIGIN;
				continue;
			}
			*vel = (*vel + force * step) * p.damping;
			let speed = vel.length();
			let disp = if speed > max_disp {
				*vel * (max_disp / speed)
			} else {
				*vel
			};
			if disp.is_finite() {
				*pos += disp;
			}
		}

		self.temperature *= p.cooling_factor;
		self.iteration += 1;
	}

	fn forces(&self) -> Vec<Point> {
		let p = &self.params;
		let n = self.positions.len();
		let mut forces = vec![Point::ORIGIN; n];

		for i in 0..n {
			for j in (i + 1)..n {
				let delta = self.positions[i] - self.positions[j];
				let dist = delta.length();
				let dir = if dist > f64::EPSILON {
					delta * (1.0 / dist)
				} else {
					separation_direction(i, j)
				};
				let mut effective = dist;
				if self.component[i] != self.component[j] {
					effective -= p.component_spacing;
				}
				let effective = effective.max(MIN_DISTANCE);
				let force = dir * (p.node_repulsion / (effective * effective));
				forces[i] += force;
				forces[j] = forces[j] - force;
			}
		}

		if p.edge_elasticity > 0.0 {
			let stiffness = SPRING_STIFFNESS / p.edge_elasticity;
			for &(s, t) in &self.edges {
				if s == t {
					continue;
				}
				let delta = self.positions[t] - self.positions[s];
				let dist = delta.length();
				if dist <= f64::EPSILON {
					continue;
				}
				let magnitude = (dist - p.ideal_edge_length) * stiffness;
				let force = delta * (magnitude / dist);
				forces[s] += force;
				forces[t] = forces[t] - force;
			}
		}

		if p.gravity != 0.0 && n > 1 {
			let centroid = self
				.positions
				.iter()
				.fold(Point::ORIGIN, |acc, &q| acc + q)
				* (1.0 / n as f64);
			for (i, &pos) in self.positions.iter().enumerate() {
				let to_center = centroid - pos;
				let dist = to_center.length();
				if dist <= f64::EPSILON {
					continue;
				}
				let magnitude = p.gravity * dist / (dist + p.ideal_edge_length);
				forces[i] += to_center * (magnitude / dist);
			}
		}

		forces
	}
}

/// Deterministic push-apart direction for coincident nodes.
fn separation_direction(i: usize, j: usize) -> Point {
	let angle = (i + j) as f64 * GOLDEN_ANGLE;
	Point::new(angle.cos(), angle.sin())
}

fn initial_positions(graph: &Graph, params: &LayoutParams) -> Vec<Point> {
	let n = graph.len();
	let mut rng = params
		.randomize
		.then(|| StdRng::seed_from_u64(params.seed));
	let half = params.ideal_edge_length * (n as f64).sqrt() / 2.0;

	graph
		.nodes()
		.iter()
		.enumerate()
		.map(|(i, node)| {
			if let Some(seed) = node.seed {
				return seed;
			}
			if n == 1 {
				return Point::ORIGIN;
			}
			match rng.as_mut() {
				Some(rng) if half > 0.0 => {
					Point::new(rng.gen_range(-half..half), rng.gen_range(-half..half))
				}
				_ => {
					let angle = i as f64 * GOLDEN_ANGLE;
					let radius = params.ideal_edge_length * 0.5 * ((i + 1) as f64).sqrt();
					Point::new(radius * angle.cos(), radius * angle.sin())
				}
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::types::{RawEdge, RawNode};

	fn graph(ids: &[&str], edges: &[(&str, &str)]) -> Graph {
		let nodes: Vec<_> = ids.iter().map(|&id| RawNode::new(id)).collect();
		let edges: Vec<_> = edges.iter().map(|&(s, t)| RawEdge::new(s, t)).collect();
		Graph::build(&nodes, &edges).unwrap()
	}

	fn dist(a: Point, b: Point) -> f64 {
		(a - b).length()
	}

	#[test]
	fn test_empty_graph_converges_immediately() {
		let g = graph(&[], &[]);
		let mut engine = LayoutEngine::new(&g, LayoutParams::default(), 1);
		assert_eq!(engine.phase(), LayoutPhase::Initializing);

		let frame = engine.step(1);
		assert!(frame.converged);
		assert_eq!(frame.iteration, 0);
		assert!(frame.positions.is_empty());
	}

	#[test]
	fn test_single_node_centered() {
		let g = graph(&["solo"], &[]);
		let frame = LayoutEngine::new(&g, LayoutParams::default(), 1).run();
		assert!(frame.converged);
		assert_eq!(frame.iteration, 0);
		assert_eq!(frame.positions, vec![Point::ORIGIN]);
	}

	#[test]
	fn test_deterministic_runs() {
		let g = graph(
			&["A", "B", "C", "D", "E"],
			&[("A", "B"), ("B", "C"), ("C", "A"), ("D", "E")],
		);
		let a = LayoutEngine::new(&g, LayoutParams::default(), 1).run();
		let b = LayoutEngine::new(&g, LayoutParams::default(), 1).run();
		assert_eq!(a.positions, b.positions);
		assert_eq!(a.iteration, b.iteration);
	}

	#[test]
	fn test_seeded_randomization_is_repeatable() {
		let g = graph(&["A", "B", "C"], &[("A", "B")]);
		let params = LayoutParams {
			randomize: true,
			seed: 7,
			..LayoutParams::default()
		};
		let a = LayoutEngine::new(&g, params.clone(), 1).run();
		let b = LayoutEngine::new(&g, params, 1).run();
		assert_eq!(a.positions, b.positions);
	}

	#[test]
	fn test_converges_within_cap_and_stays_finite() {
		let g = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
		let params = LayoutParams::default();
		let frame = LayoutEngine::new(&g, params.clone(), 1).run();
		assert!(frame.converged);
		assert!(frame.iteration <= params.num_iter);
		assert!(frame.positions.iter().all(|p| p.is_finite()));
	}

	#[test]
	fn test_iteration_cap_stops_non_cooling_run() {
		let g = graph(&["A", "B"], &[("A", "B")]);
		let params = LayoutParams {
			cooling_factor: 1.0,
			num_iter: 25,
			..LayoutParams::default()
		};
		let frame = LayoutEngine::new(&g, params, 1).run();
		assert!(frame.converged);
		assert_eq!(frame.iteration, 25);
	}

	#[test]
	fn test_chunked_steps_match_full_run() {
		let g = graph(&["A", "B", "C", "D"], &[("A", "B"), ("C", "D"), ("B", "C")]);
		let full = LayoutEngine::new(&g, LayoutParams::default(), 3).run();

		let mut chunked = LayoutEngine::new(&g, LayoutParams::default(), 3);
		let mut frame = chunked.step(7);
		assert_eq!(chunked.phase(), LayoutPhase::Iterating);
		while !frame.converged {
			frame = chunked.step(7);
		}
		assert_eq!(frame.positions, full.positions);
		assert_eq!(frame.generation, 3);
	}

	#[test]
	fn test_edges_pull_connected_nodes_closer() {
		let g = graph(&["A", "B", "C"], &[("A", "B")]);
		let frame = LayoutEngine::new(&g, LayoutParams::default(), 1).run();
		let [a, b, c] = [frame.positions[0], frame.positions[1], frame.positions[2]];
		assert!(dist(a, b) < dist(a, c));
		assert!(dist(a, b) < dist(b, c));
	}

	#[test]
	fn test_spring_force_is_linear_in_stretch() {
		let params = LayoutParams {
			node_repulsion: 0.0,
			gravity: 0.0,
			..LayoutParams::default()
		};
		let spring_force = |stretch: f64| {
			let nodes = vec![
				RawNode::new("A").with_position(0.0, 0.0),
				RawNode::new("B").with_position(params.ideal_edge_length + stretch, 0.0),
			];
			let g = Graph::build(&nodes, &[RawEdge::new("A", "B")]).unwrap();
			let forces = LayoutEngine::new(&g, params.clone(), 1).forces();
			assert!((forces[0].x + forces[1].x).abs() < 1e-9);
			forces[0].x
		};

		let (short, long) = (spring_force(10.0), spring_force(20.0));
		assert!((short - 10.0 * SPRING_STIFFNESS / params.edge_elasticity).abs() < 1e-9);
		assert!((long / short - 2.0).abs() < 1e-9);
		// Compressed springs push apart.
		assert!(spring_force(-10.0) < 0.0);
	}

	#[test]
	fn test_disconnected_components_keep_their_spacing() {
		let g = graph(
			&["A", "B", "C", "D", "E"],
			&[("A", "B"), ("B", "C"), ("C", "A"), ("D", "E")],
		);
		let params = LayoutParams::default();
		let frame = LayoutEngine::new(&g, params.clone(), 1).run();
		let p = &frame.positions;

		let closest = (0..3)
			.flat_map(|i| (3..5).map(move |j| (i, j)))
			.map(|(i, j)| dist(p[i], p[j]))
			.fold(f64::INFINITY, f64::min);
		assert!(closest >= params.component_spacing, "closest {closest}");
	}

	#[test]
	fn test_gravity_limits_component_drift() {
		let g = graph(
			&["A", "B", "C", "D", "E"],
			&[("A", "B"), ("B", "C"), ("C", "A"), ("D", "E")],
		);
		let extent = |gravity: f64| {
			let params = LayoutParams {
				gravity,
				..LayoutParams::default()
			};
			let frame = LayoutEngine::new(&g, params, 1).run();
			let (mut lo, mut hi) = (Point::new(f64::MAX, f64::MAX), Point::new(f64::MIN, f64::MIN));
			for q in &frame.positions {
				lo = Point::new(lo.x.min(q.x), lo.y.min(q.y));
				hi = Point::new(hi.x.max(q.x), hi.y.max(q.y));
			}
			(hi.x - lo.x).max(hi.y - lo.y)
		};

		let (held, free) = (extent(80.0), extent(0.0));
		assert!(held < free, "with gravity {held}, without {free}");
		assert!(held < 20.0 * LayoutParams::default().ideal_edge_length);
	}

	#[test]
	fn test_coincident_seeds_are_separated() {
		let nodes = vec![
			RawNode::new("A").with_position(5.0, 5.0),
			RawNode::new("B").with_position(5.0, 5.0),
		];
		let g = Graph::build(&nodes, &[]).unwrap();
		let frame = LayoutEngine::new(&g, LayoutParams::default(), 1).run();
		assert!(dist(frame.positions[0], frame.positions[1]) > 1.0);
	}

	#[test]
	fn test_frame_to_map() {
		let g = graph(&["A", "B"], &[]);
		let frame = LayoutEngine::new(&g, LayoutParams::default(), 1).run();
		let map = frame.to_map(&g);
		assert_eq!(map.len(), 2);
		assert_eq!(map["B"], frame.positions[1]);
	}

	#[test]
	fn test_params_from_partial_json() {
		let params: LayoutParams =
			serde_json::from_str(r#"{"idealEdgeLength": 90, "numIter": 50}"#).unwrap();
		assert_eq!(params.ideal_edge_length, 90.0);
		assert_eq!(params.num_iter, 50);
		assert_eq!(params.node_repulsion, 450_000.0);
		assert_eq!(params.padding, 60.0);
	}
}
