//! Leptos component wrapping the graph canvas.
//!
//! The component creates an HTML canvas element and wires up mouse, wheel and
//! touch handlers for hover, selection, panning and zooming. An animation loop
//! runs via `requestAnimationFrame`, advancing the layout by one chunk and
//! redrawing each frame.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, MouseEvent, ResizeObserver,
	TouchEvent, WheelEvent,
};

use super::layout::LayoutParams;
use super::model::NodeDetails;
use super::render;
use super::scale::{ScaleConfig, ScaledValues};
use super::state::GraphViewState;
use super::theme::Theme;
use super::types::GraphData;
use super::viewport::SettleRetry;

/// Bundles view state with visual configuration (scaling, theme).
struct GraphContext {
	state: GraphViewState,
	scale: ScaleConfig,
	theme: Theme,
}

impl GraphContext {
	fn scaled(&self) -> ScaledValues {
		ScaledValues::new(&self.scale, self.state.viewport.transform().k)
	}
}

type Shared<T> = Rc<RefCell<Option<T>>>;

/// Longest frame step fed to animations, in seconds.
const MAX_FRAME_DT: f64 = 0.1;

fn canvas_point(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	client_x: i32,
	client_y: i32,
) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((client_x as f64 - rect.left(), client_y as f64 - rect.top()))
}

/// Size of the area the canvas should fill.
fn container_size(canvas: &HtmlCanvasElement, fullscreen: bool) -> Option<(f64, f64)> {
	if fullscreen {
		let window = web_sys::window()?;
		let width = window.inner_width().ok()?.as_f64()?;
		let height = window.inner_height().ok()?.as_f64()?;
		return Some((width, height));
	}
	let parent = canvas.parent_element()?;
	Some((parent.client_width() as f64, parent.client_height() as f64))
}

/// Renders an interactive entity graph on a canvas element.
///
/// Pass graph data via the reactive `data` signal; every change starts a new
/// layout. The component sizes itself to its parent container by default; set
/// `fullscreen = true` to fill the window. `on_node_click` receives the public
/// attributes of clicked nodes, and `selected` lets the host drive selection.
#[component]
pub fn GraphView(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(optional)] params: Option<LayoutParams>,
	#[prop(optional)] theme: Option<Theme>,
	#[prop(optional, into)] on_node_click: Option<Callback<NodeDetails>>,
	#[prop(optional, into)] selected: Option<Signal<Option<String>>>,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<GraphContext>> = Rc::new(RefCell::new(GraphContext {
		state: GraphViewState::new(params.unwrap_or_default()),
		scale: ScaleConfig::default(),
		theme: theme.unwrap_or_default(),
	}));
	let animate: Shared<Closure<dyn FnMut(f64)>> = Rc::new(RefCell::new(None));
	let resize_cb: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let observer: Shared<ResizeObserver> = Rc::new(RefCell::new(None));

	let context_data = context.clone();
	Effect::new(move |_| {
		let data = data.get();
		// Errors are logged by the state; the view stays empty.
		let _ = context_data.borrow_mut().state.replace_data(&data);
	});

	if let Some(selected) = selected {
		let context_sel = context.clone();
		Effect::new(move |_| {
			let id = selected.get();
			context_sel.borrow_mut().state.set_selected(id.as_deref());
		});
	}

	let context_init = context.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			error!("graph view: no window");
			return;
		};
		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => {
					error!("graph view: 2d context has unexpected type");
					return;
				}
			},
			_ => {
				error!("graph view: canvas 2d context unavailable");
				return;
			}
		};

		if let Some((w, h)) = container_size(&canvas, fullscreen) {
			context_init.borrow_mut().state.observe_size(w, h);
		}

		let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
		*resize_cb.borrow_mut() = Some(Closure::new(move || {
			if let Some((w, h)) = container_size(&canvas_resize, fullscreen) {
				context_resize.borrow_mut().state.observe_size(w, h);
			}
		}));

		let mut observed = false;
		if let Some(ref cb) = *resize_cb.borrow() {
			if fullscreen {
				observed = window
					.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref())
					.is_ok();
			} else if let Some(parent) = canvas.parent_element() {
				match ResizeObserver::new(cb.as_ref().unchecked_ref()) {
					Ok(ro) => {
						ro.observe(&parent);
						*observer.borrow_mut() = Some(ro);
						observed = true;
					}
					Err(e) => warn!("graph view: ResizeObserver unavailable: {:?}", e),
				}
			}
		}
		let mut retry = (!observed).then(SettleRetry::default);
		if retry.is_some() {
			debug!("graph view: polling container size with backoff");
		}

		let frame_handle = Rc::new(Cell::new(None::<i32>));
		let (context_anim, animate_inner, canvas_anim, handle_inner) = (
			context_init.clone(),
			animate.clone(),
			canvas.clone(),
			frame_handle.clone(),
		);
		let mut frame: u64 = 0;
		let mut last_time: Option<f64> = None;
		let mut last_cursor = "";
		*animate.borrow_mut() = Some(Closure::new(move |now: f64| {
			frame += 1;
			let dt = last_time
				.map(|t| ((now - t) / 1000.0).clamp(0.0, MAX_FRAME_DT))
				.unwrap_or(0.016);
			last_time = Some(now);

			if let Some(ref mut poll) = retry {
				if poll.poll_due(frame) {
					if let Some((w, h)) = container_size(&canvas_anim, fullscreen) {
						context_anim.borrow_mut().state.observe_size(w, h);
					}
				}
				if poll.exhausted() {
					debug!("graph view: stopped polling container size");
					retry = None;
				}
			}

			{
				let mut c = context_anim.borrow_mut();
				let update = c.state.tick(dt);
				if let Some(size) = update.resized {
					canvas_anim.set_width(size.width as u32);
					canvas_anim.set_height(size.height as u32);
				}
				let cursor = c.state.cursor().as_css();
				if cursor != last_cursor {
					let _ = HtmlElement::style(&canvas_anim).set_property("cursor", cursor);
					last_cursor = cursor;
				}
				render::render(&c.state, &ctx, &c.scale, &c.theme);
			}

			if let (Some(cb), Some(window)) = (&*animate_inner.borrow(), web_sys::window()) {
				handle_inner.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				Ok(handle) => frame_handle.set(Some(handle)),
				Err(_) => error!("graph view: requestAnimationFrame failed"),
			}
		}

		// Runs when the view unmounts or the canvas is replaced.
		let resources = SendWrapper::new((
			animate.clone(),
			frame_handle,
			resize_cb.clone(),
			observer.clone(),
			window,
		));
		on_cleanup(move || {
			let (animate, frame_handle, resize_cb, observer, window) = resources.take();
			if let Some(handle) = frame_handle.take() {
				let _ = window.cancel_animation_frame(handle);
			}
			// Dropping the closure breaks its reference cycle through `animate`.
			animate.borrow_mut().take();
			if let Some(ro) = observer.borrow_mut().take() {
				ro.disconnect();
			}
			if let Some(cb) = resize_cb.borrow_mut().take() {
				if fullscreen {
					let _ = window
						.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
			}
			debug!("graph view: released animation loop and resize observers");
		});
	});

	// Clicks are reported after the state borrow is released so the host may
	// update signals from inside the callback.
	let report = move |details: Option<NodeDetails>| {
		if let (Some(details), Some(cb)) = (details, on_node_click) {
			cb.run(details);
		}
	};

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = canvas_point(canvas_ref, ev.client_x(), ev.client_y()) {
			context_md.borrow_mut().state.pan.begin(x, y);
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		let mut c = context_mm.borrow_mut();
		if c.state.pan.active {
			let (dx, dy) = c.state.pan.update(x, y);
			if c.state.pan.moved {
				c.state.viewport.pan_by(dx, dy);
			}
		} else {
			let scale = c.scaled();
			let GraphContext { state, theme, .. } = &mut *c;
			state.pointer_move(x, y, theme, &scale);
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let details = {
			let mut c = context_mu.borrow_mut();
			let was_click = c.state.pan.active && !c.state.pan.moved;
			c.state.pan.end();
			match canvas_point(canvas_ref, ev.client_x(), ev.client_y()) {
				Some((x, y)) if was_click => {
					let scale = c.scaled();
					let GraphContext { state, theme, .. } = &mut *c;
					state.click(x, y, theme, &scale)
				}
				_ => None,
			}
		};
		report(details);
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		context_ml.borrow_mut().state.pointer_leave();
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = canvas_point(canvas_ref, ev.client_x(), ev.client_y()) {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			context_wh.borrow_mut().state.viewport.zoom_at(x, y, factor);
		}
	};

	let context_ts = context.clone();
	let on_touchstart = move |ev: TouchEvent| {
		let Some(touch) = ev.touches().get(0) else {
			return;
		};
		if let Some((x, y)) = canvas_point(canvas_ref, touch.client_x(), touch.client_y()) {
			ev.prevent_default();
			context_ts.borrow_mut().state.pan.begin(x, y);
		}
	};

	let context_tm = context.clone();
	let on_touchmove = move |ev: TouchEvent| {
		let Some(touch) = ev.touches().get(0) else {
			return;
		};
		let Some((x, y)) = canvas_point(canvas_ref, touch.client_x(), touch.client_y()) else {
			return;
		};
		ev.prevent_default();
		let mut c = context_tm.borrow_mut();
		if c.state.pan.active {
			let (dx, dy) = c.state.pan.update(x, y);
			if c.state.pan.moved {
				c.state.viewport.pan_by(dx, dy);
			}
		}
	};

	let context_te = context.clone();
	let on_touchend = move |ev: TouchEvent| {
		let details = {
			let mut c = context_te.borrow_mut();
			let was_tap = c.state.pan.active && !c.state.pan.moved;
			c.state.pan.end();
			let point = ev
				.changed_touches()
				.get(0)
				.and_then(|t| canvas_point(canvas_ref, t.client_x(), t.client_y()));
			match point {
				Some((x, y)) if was_tap => {
					let scale = c.scaled();
					let GraphContext { state, theme, .. } = &mut *c;
					state.click(x, y, theme, &scale)
				}
				_ => None,
			}
		};
		report(details);
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="graph-view-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			style="display: block; cursor: grab; touch-action: none;"
		/>
	}
}
