//! Canonical graph representation built from raw input records.
//!
//! Building is pure: the same input always yields the same graph. The only
//! hard failure is a node id collision; edges whose endpoints do not exist are
//! dropped and counted so the rest of the graph still renders.

use std::collections::HashMap;

use log::warn;
use serde::Serialize;
use thiserror::Error;

use super::types::{GraphData, Point, RawEdge, RawNode};

/// Type name used for styling when a node has no type.
pub const DEFAULT_NODE_TYPE: &str = "Entity";

/// Input that cannot be turned into a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidGraphError {
	#[error("duplicate node id `{id}`")]
	DuplicateNodeId { id: String },
}

/// A normalized entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: String,
	/// Entity type as supplied; `None` when the input had none.
	pub kind: Option<String>,
	pub label: String,
	pub description: Option<String>,
	/// Caller-supplied starting position for the layout.
	pub seed: Option<Point>,
}

impl Node {
	/// Type name used for style lookup.
	pub fn type_name(&self) -> &str {
		self.kind.as_deref().unwrap_or(DEFAULT_NODE_TYPE)
	}

	/// The public attributes handed to the host when the node is clicked.
	pub fn details(&self) -> NodeDetails {
		NodeDetails {
			id: self.id.clone(),
			kind: self.kind.clone(),
			label: self.label.clone(),
			description: self.description.clone(),
		}
	}
}

/// Public node attributes delivered to the host's click callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeDetails {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: Option<String>,
	pub label: String,
	pub description: Option<String>,
}

/// A normalized relation with resolved endpoint indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub id: String,
	pub source: usize,
	pub target: usize,
	pub label: Option<String>,
}

/// Nodes and edges of one data generation.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	index: HashMap<String, usize>,
	component: Vec<usize>,
	component_count: usize,
	dropped_edges: usize,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.trim().is_empty())
}

fn normalize_label(raw: &RawNode) -> String {
	non_blank(raw.label.as_deref())
		.or_else(|| non_blank(raw.name.as_deref()))
		.or_else(|| non_blank(raw.data.as_ref().and_then(|d| d.label.as_deref())))
		.unwrap_or(&raw.id)
		.to_string()
}

impl Graph {
	/// Build a graph, rejecting duplicate node ids and dropping dangling edges.
	pub fn build(nodes: &[RawNode], edges: &[RawEdge]) -> Result<Self, InvalidGraphError> {
		let mut index = HashMap::with_capacity(nodes.len());
		let mut out_nodes = Vec::with_capacity(nodes.len());

		for raw in nodes {
			if index.insert(raw.id.clone(), out_nodes.len()).is_some() {
				return Err(InvalidGraphError::DuplicateNodeId { id: raw.id.clone() });
			}
			out_nodes.push(Node {
				id: raw.id.clone(),
				kind: raw.kind.clone(),
				label: normalize_label(raw),
				description: raw.description.clone(),
				seed: raw.position.filter(|p| p.is_finite()),
			});
		}

		let mut out_edges = Vec::with_capacity(edges.len());
		let mut dropped_edges = 0;
		for (i, raw) in edges.iter().enumerate() {
			let id = raw.id.clone().unwrap_or_else(|| format!("e{i}"));
			match (index.get(&raw.source), index.get(&raw.target)) {
				(Some(&source), Some(&target)) => out_edges.push(Edge {
					id,
					source,
					target,
					label: raw.label.clone(),
				}),
				_ => {
					warn!(
						"graph: dropping edge {} ({} -> {}): missing endpoint",
						id, raw.source, raw.target
					);
					dropped_edges += 1;
				}
			}
		}

		let (component, component_count) = label_components(out_nodes.len(), &out_edges);

		Ok(Self {
			nodes: out_nodes,
			edges: out_edges,
			index,
			component,
			component_count,
			dropped_edges,
		})
	}

	pub fn from_data(data: &GraphData) -> Result<Self, InvalidGraphError> {
		Self::build(&data.nodes, &data.edges)
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Number of input edges dropped for referencing a missing node.
	pub fn dropped_edges(&self) -> usize {
		self.dropped_edges
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.index_of(id).map(|i| &self.nodes[i])
	}

	/// Indices of nodes sharing an edge with `index`, in edge order.
	pub fn neighbors(&self, index: usize) -> Vec<usize> {
		let mut out = Vec::new();
		for edge in &self.edges {
			let other = if edge.source == index {
				edge.target
			} else if edge.target == index {
				edge.source
			} else {
				continue;
			};
			if other != index && !out.contains(&other) {
				out.push(other);
			}
		}
		out
	}

	/// Connected component id of a node. Ids are dense, in first-seen order.
	pub fn component_of(&self, index: usize) -> usize {
		self.component[index]
	}

	pub fn component_count(&self) -> usize {
		self.component_count
	}

	/// Nodes whose label contains `query`, ignoring case. A blank query
	/// matches every node.
	pub fn search(&self, query: &str) -> Vec<&Node> {
		let query = query.trim().to_lowercase();
		self.nodes
			.iter()
			.filter(|n| query.is_empty() || n.label.to_lowercase().contains(&query))
			.collect()
	}
}

/// Union-find over the edge list, relabelled to dense ids in node order.
fn label_components(n: usize, edges: &[Edge]) -> (Vec<usize>, usize) {
	fn find(parent: &mut [usize], mut i: usize) -> usize {
		while parent[i] != i {
			parent[i] = parent[parent[i]];
			i = parent[i];
		}
		i
	}

	let mut parent: Vec<usize> = (0..n).collect();
	for edge in edges {
		let (a, b) = (find(&mut parent, edge.source), find(&mut parent, edge.target));
		if a != b {
			parent[a.max(b)] = a.min(b);
		}
	}

	let mut dense: HashMap<usize, usize> = HashMap::new();
	let mut component = Vec::with_capacity(n);
	for i in 0..n {
		let root = find(&mut parent, i);
		let next = dense.len();
		component.push(*dense.entry(root).or_insert(next));
	}
	(component, dense.len())
}
