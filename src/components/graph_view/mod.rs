//! Interactive entity graph view.
//!
//! Lays out an entity-relationship graph with a simulated-annealing force
//! model and renders it on an HTML canvas with:
//! - Chunked layout that animates towards a converged arrangement
//! - Per-type node colors and shapes, hover growth and selection borders
//! - Automatic fit-to-viewport, plus pan and wheel zoom
//! - Click/tap selection reported to the host
//!
//! Everything except [`component`] and [`render`] is plain Rust and runs
//! outside the browser.
//!
//! # Example
//!
//! ```ignore
//! use entity_graph::{GraphData, GraphView, RawEdge, RawNode};
//!
//! let data = GraphData {
//!     nodes: vec![RawNode::new("a").with_kind("Person"), RawNode::new("b")],
//!     edges: vec![RawEdge::new("a", "b").with_label("knows")],
//! };
//!
//! view! {
//!     <GraphView
//!         data=Signal::derive(move || data.clone())
//!         on_node_click=move |details: NodeDetails| log::info!("{}", details.id)
//!     />
//! }
//! ```

mod component;
pub mod interaction;
pub mod layout;
pub mod model;
mod render;
pub mod scale;
pub mod state;
pub mod style;
pub mod theme;
pub mod types;
pub mod viewport;

pub use component::GraphView;
pub use layout::{LayoutEngine, LayoutParams};
pub use model::{Graph, InvalidGraphError, NodeDetails};
pub use state::GraphViewState;
pub use theme::Theme;
pub use types::{GraphData, Point, RawEdge, RawNode};
