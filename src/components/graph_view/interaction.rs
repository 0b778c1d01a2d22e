//! Pointer-driven hover and selection state.
//!
//! Hover and selection are independent slots holding node ids. Hover is
//! transient feedback that follows the pointer; selection is the sticky
//! last-clicked node reported to the host. Clicking empty space never
//! deselects: the host decides when selection ends.
//!
//! Pointer events may be handled after the graph they were aimed at has been
//! replaced, so every event naming an id that is not in the current graph is
//! ignored.

use super::model::{Graph, NodeDetails};
use super::style::StyleFlags;

/// Mouse cursor to show over the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cursor {
	Grab,
	Grabbing,
	Pointer,
}

impl Cursor {
	pub fn as_css(self) -> &'static str {
		match self {
			Cursor::Grab => "grab",
			Cursor::Grabbing => "grabbing",
			Cursor::Pointer => "pointer",
		}
	}
}

/// Hover and selection slots for one graph generation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractionController {
	hovered: Option<String>,
	selected: Option<String>,
}

impl InteractionController {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn hovered(&self) -> Option<&str> {
		self.hovered.as_deref()
	}

	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Style flags for node `id`.
	pub fn flags(&self, id: &str) -> StyleFlags {
		StyleFlags {
			selected: self.selected.as_deref() == Some(id),
			hovered: self.hovered.as_deref() == Some(id),
		}
	}

	/// Pointer moved over `hit` (or over no node). Returns whether the hovered
	/// node changed.
	pub fn pointer_move(&mut self, hit: Option<&str>, graph: &Graph) -> bool {
		let next = hit.filter(|id| graph.contains(id));
		if self.hovered.as_deref() == next {
			return false;
		}
		self.hovered = next.map(str::to_string);
		true
	}

	/// Pointer left the surface.
	pub fn pointer_leave(&mut self) -> bool {
		self.hovered.take().is_some()
	}

	/// Click or tap. Selecting a node replaces any previous selection and
	/// returns the payload for the host's click callback. Clicks on empty space
	/// or on ids no longer in `graph` do nothing.
	pub fn click(&mut self, hit: Option<&str>, graph: &Graph) -> Option<NodeDetails> {
		let node = graph.node(hit?)?;
		self.selected = Some(node.id.clone());
		Some(node.details())
	}

	/// Host-driven selection by id. Returns whether `id` exists.
	pub fn select_by_id(&mut self, id: &str, graph: &Graph) -> bool {
		if !graph.contains(id) {
			return false;
		}
		self.selected = Some(id.to_string());
		true
	}

	/// Host-driven deselection.
	pub fn clear_selection(&mut self) {
		self.selected = None;
	}

	/// Start over for a new graph generation.
	pub fn reset(&mut self) {
		self.hovered = None;
		self.selected = None;
	}

	pub fn cursor(&self, panning: bool) -> Cursor {
		if panning {
			Cursor::Grabbing
		} else if self.hovered.is_some() {
			Cursor::Pointer
		} else {
			Cursor::Grab
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::types::RawNode;

	fn graph(ids: &[&str]) -> Graph {
		let nodes: Vec<_> = ids.iter().map(|&id| RawNode::new(id)).collect();
		Graph::build(&nodes, &[]).unwrap()
	}

	#[test]
	fn test_hover_enter_and_leave() {
		let g = graph(&["A", "B"]);
		let mut ctl = InteractionController::new();

		assert!(ctl.pointer_move(Some("A"), &g));
		assert!(!ctl.pointer_move(Some("A"), &g));
		assert_eq!(ctl.hovered(), Some("A"));
		assert_eq!(ctl.cursor(false), Cursor::Pointer);
		assert!(ctl.flags("A").hovered);
		assert!(!ctl.flags("B").hovered);

		assert!(ctl.pointer_move(None, &g));
		assert_eq!(ctl.hovered(), None);
		assert_eq!(ctl.cursor(false), Cursor::Grab);

		ctl.pointer_move(Some("B"), &g);
		assert!(ctl.pointer_leave());
		assert!(!ctl.pointer_leave());
	}

	#[test]
	fn test_click_selects_and_replaces() {
		let g = graph(&["A", "B", "C"]);
		let mut ctl = InteractionController::new();

		for id in ["A", "B", "C"] {
			let details = ctl.click(Some(id), &g).unwrap();
			assert_eq!(details.id, id);
			assert_eq!(ctl.selected(), Some(id));
		}
		assert!(!ctl.flags("A").selected);
		assert!(ctl.flags("C").selected);
	}

	#[test]
	fn test_click_on_empty_space_keeps_selection() {
		let g = graph(&["A"]);
		let mut ctl = InteractionController::new();
		ctl.click(Some("A"), &g);

		assert_eq!(ctl.click(None, &g), None);
		assert_eq!(ctl.selected(), Some("A"));

		ctl.clear_selection();
		assert_eq!(ctl.selected(), None);
	}

	#[test]
	fn test_stale_ids_are_ignored() {
		let g = graph(&["A"]);
		let mut ctl = InteractionController::new();

		assert_eq!(ctl.click(Some("gone"), &g), None);
		assert!(!ctl.pointer_move(Some("gone"), &g));
		assert!(!ctl.select_by_id("gone", &g));
		assert_eq!(ctl, InteractionController::default());
	}

	#[test]
	fn test_reset_clears_both_slots() {
		let g = graph(&["A", "B"]);
		let mut ctl = InteractionController::new();
		ctl.click(Some("A"), &g);
		ctl.pointer_move(Some("B"), &g);

		ctl.reset();
		assert_eq!(ctl.selected(), None);
		assert_eq!(ctl.hovered(), None);
	}

	#[test]
	fn test_cursor_while_panning() {
		assert_eq!(InteractionController::new().cursor(true).as_css(), "grabbing");
	}
}
