//! entity-graph: Interactive entity-relationship graph viewer.
//!
//! This crate provides a WASM-based graph component that lays out entities
//! with a force-directed annealing model, styles them by entity type, and
//! reports clicked entities to the host page.

use std::sync::Arc;

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

// Enables the browser entropy backend that `rand` needs on wasm32.
#[cfg(target_arch = "wasm32")]
use getrandom as _;

pub use components::graph_view::{
	Graph, GraphData, GraphView, GraphViewState, InvalidGraphError, LayoutEngine, LayoutParams,
	NodeDetails, Point, RawEdge, RawNode, Theme,
};

use components::graph_view::model::DEFAULT_NODE_TYPE;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("entity-graph: logging initialized");
}

/// Optional page configuration read from `<script id="graph-config">`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageConfig {
	/// Layout parameter overrides; missing keys keep their defaults.
	pub layout: LayoutParams,
	/// Built-in theme name (`"default"` or `"light"`).
	pub theme: Option<String>,
	/// Page heading and document title.
	pub title: Option<String>,
}

fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

fn parse_graph_data(json_text: &str) -> Option<GraphData> {
	match serde_json::from_str::<GraphData>(json_text) {
		Ok(data) => {
			info!(
				"entity-graph: loaded {} nodes, {} edges",
				data.nodes.len(),
				data.edges.len()
			);
			Some(data)
		}
		Err(e) => {
			warn!("entity-graph: failed to parse graph data: {}", e);
			None
		}
	}
}

fn parse_page_config(json_text: &str) -> Option<PageConfig> {
	serde_json::from_str(json_text)
		.map_err(|e| warn!("entity-graph: ignoring invalid graph config: {}", e))
		.ok()
}

/// Load graph data from a script element with id="graph-data".
/// Expected format: JSON with { nodes: [...], edges: [...] }
fn load_graph_data() -> Option<GraphData> {
	parse_graph_data(&script_text("graph-data")?)
}

fn load_page_config() -> Option<PageConfig> {
	parse_page_config(&script_text("graph-config")?)
}

/// Main application component.
/// Loads graph data from the DOM and renders the graph with a details panel
/// and an entity search list.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let graph_data = load_graph_data().unwrap_or_default();
	let config = load_page_config().unwrap_or_default();
	let theme = Theme::by_name(config.theme.as_deref().unwrap_or("default"));
	let theme_name = theme.name;
	let title = config
		.title
		.clone()
		.unwrap_or_else(|| "Entity Graph".to_string());

	let (graph, load_error) = match Graph::from_data(&graph_data) {
		Ok(graph) => (Arc::new(graph), None),
		Err(e) => (Arc::new(Graph::default()), Some(e.to_string())),
	};
	let graph_signal = Signal::derive(move || graph_data.clone());

	let (selected, set_selected) = signal(None::<NodeDetails>);
	let selected_id = Signal::derive(move || selected.get().map(|d| d.id));
	let on_node_click = Callback::new(move |details: NodeDetails| {
		info!("entity-graph: selected {}", details.id);
		set_selected.set(Some(details));
	});

	let (query, set_query) = signal(String::new());
	let matches = move || {
		graph
			.search(&query.get())
			.into_iter()
			.map(|node| node.details())
			.collect::<Vec<_>>()
	};

	let details_panel = move || {
		selected.get().map(|details| {
			let kind = details
				.kind
				.clone()
				.unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string());
			let description = details
				.description
				.clone()
				.unwrap_or_else(|| "No description available.".to_string());
			view! {
				<aside class="details-panel">
					<button class="close" on:click=move |_| set_selected.set(None)>"×"</button>
					<h2>{details.label.clone()}</h2>
					<p class="entity-type">{kind}</p>
					<p class="description">{description}</p>
				</aside>
			}
		})
	};

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme=theme_name />
		<Title text=title.clone() />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<GraphView
				data=graph_signal
				params=config.layout
				theme=theme
				on_node_click=on_node_click
				selected=selected_id
				fullscreen=true
			/>
			<div class="graph-overlay">
				<h1>{title}</h1>
				<p class="subtitle">"Click an entity for details. Scroll to zoom. Drag to pan."</p>
				{load_error.map(|msg| view! { <p class="graph-error">{msg}</p> })}
				<input
					class="entity-search"
					type="search"
					placeholder="Search entities"
					prop:value=query
					on:input=move |ev| set_query.set(event_target_value(&ev))
				/>
				<ul class="entity-list">
					{move || {
						matches()
							.into_iter()
							.map(|details| {
								let label = details.label.clone();
								view! {
									<li on:click=move |_| set_selected.set(Some(details.clone()))>
										{label}
									</li>
								}
							})
							.collect_view()
					}}
				</ul>
			</div>
			{details_panel}
		</div>
	}
}
