//! Raw input records for the graph view, as delivered by the data layer.
//!
//! Records are deliberately loose: labels may arrive under several field
//! names, types and descriptions may be missing, and edges may omit their id.
//! [`Graph::build`](super::model::Graph::build) turns them into the canonical
//! representation.

use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A 2-D point or vector in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn length(self) -> f64 {
		(self.x * self.x + self.y * self.y).sqrt()
	}

	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

impl Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl AddAssign for Point {
	fn add_assign(&mut self, rhs: Point) {
		self.x += rhs.x;
		self.y += rhs.y;
	}
}

impl Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Point {
	type Output = Point;

	fn mul(self, rhs: f64) -> Point {
		Point::new(self.x * rhs, self.y * rhs)
	}
}

/// Nested `data` object some producers wrap node fields in.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawNodeData {
	pub label: Option<String>,
}

/// An entity record as received from the data layer.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawNode {
	/// Unique identifier. Edges reference nodes by this value.
	pub id: String,
	/// Preferred display label.
	pub label: Option<String>,
	/// Alternative label field used by some producers.
	pub name: Option<String>,
	/// Wrapped label, checked last.
	pub data: Option<RawNodeData>,
	/// Entity type (e.g. "Company", "Person"). Open-ended.
	#[serde(rename = "type")]
	pub kind: Option<String>,
	pub description: Option<String>,
	/// Optional starting position for the layout.
	pub position: Option<Point>,
}

impl RawNode {
	/// Shorthand for a node carrying only an id.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			..Self::default()
		}
	}

	pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
		self.kind = Some(kind.into());
		self
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn with_position(mut self, x: f64, y: f64) -> Self {
		self.position = Some(Point::new(x, y));
		self
	}
}

/// A relation record as received from the data layer.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawEdge {
	/// Edge id. Synthesized as `e<index>` when absent.
	pub id: Option<String>,
	pub source: String,
	pub target: String,
	pub label: Option<String>,
}

impl RawEdge {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			..Self::default()
		}
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}
}

/// Complete input data set: nodes and edges.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphData {
	#[serde(default)]
	pub nodes: Vec<RawNode>,
	#[serde(default)]
	pub edges: Vec<RawEdge>,
}
