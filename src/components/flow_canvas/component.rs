use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use crate::graph::{Connection, Edge, EdgeChange, Node, NodeChange, NodeId};

use super::render;
use super::state::{self, Hit, Release, SurfaceState};
use super::types::{CanvasOptions, SurfaceError};

type Shared<T> = Rc<RefCell<Option<T>>>;
type FrameCallback = Shared<Closure<dyn FnMut()>>;
type FrameId = Rc<Cell<Option<i32>>>;

const ZOOM_STEP: f64 = 1.2;

fn window() -> Result<Window, SurfaceError> {
	web_sys::window().ok_or(SurfaceError::NoWindow)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, SurfaceError> {
	canvas
		.get_context("2d")
		.map_err(|e| SurfaceError::Context(format!("{e:?}")))?
		.ok_or(SurfaceError::NoContext)?
		.dyn_into()
		.map_err(|_| SurfaceError::NoContext)
}

fn container_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|&(w, h)| w > 0.0 && h > 0.0)
		.unwrap_or((800.0, 600.0))
}

/// Stops the frame loop, detaches the resize listener and releases both closures.
fn unmount_surface(
	state: Shared<SurfaceState>,
	animate: FrameCallback,
	resize_cb: FrameCallback,
	frame: FrameId,
) {
	if let Some(win) = web_sys::window() {
		if let Some(id) = frame.take() {
			let _ = win.cancel_animation_frame(id);
		}
		if let Some(cb) = resize_cb.borrow_mut().take() {
			let _ = win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
	}
	resize_cb.borrow_mut().take();
	animate.borrow_mut().take();
	state.borrow_mut().take();
	debug!("flow canvas unmounted");
}

fn with_graph<R>(
	nodes: Signal<Vec<Node>>,
	edges: Signal<Vec<Edge>>,
	f: impl FnOnce(&[Node], &[Edge]) -> R,
) -> R {
	nodes.with_untracked(|ns| edges.with_untracked(|es| f(ns.as_slice(), es.as_slice())))
}

#[allow(clippy::too_many_arguments)]
fn mount_surface(
	canvas: HtmlCanvasElement,
	state: Shared<SurfaceState>,
	animate: FrameCallback,
	resize_cb: FrameCallback,
	frame: FrameId,
	nodes: Signal<Vec<Node>>,
	edges: Signal<Vec<Edge>>,
	options: CanvasOptions,
	fit_view: bool,
) -> Result<(), SurfaceError> {
	let window = window()?;
	let (w, h) = container_size(&canvas);
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);
	let ctx = context_2d(&canvas)?;

	let mut surface = SurfaceState::new(w, h, options);
	if fit_view {
		nodes.with_untracked(|ns| surface.fit_view(ns));
	}
	*state.borrow_mut() = Some(surface);

	let (state_resize, canvas_resize) = (state.clone(), canvas.clone());
	*resize_cb.borrow_mut() = Some(Closure::new(move || {
		let (nw, nh) = container_size(&canvas_resize);
		canvas_resize.set_width(nw as u32);
		canvas_resize.set_height(nh as u32);
		if let Some(ref mut s) = *state_resize.borrow_mut() {
			s.resize(nw, nh);
		}
	}));
	if let Some(ref cb) = *resize_cb.borrow() {
		let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
	}

	let (state_anim, animate_inner, frame_inner) = (state.clone(), animate.clone(), frame.clone());
	*animate.borrow_mut() = Some(Closure::new(move || {
		if let Some(ref s) = *state_anim.borrow() {
			with_graph(nodes, edges, |ns, es| render::render(s, ns, es, &ctx));
		}
		// The cell is emptied on unmount, which ends the loop.
		if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
			frame_inner.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	}));
	if let Some(ref cb) = *animate.borrow() {
		frame.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
	}
	debug!("flow canvas mounted at {w}x{h}");
	Ok(())
}

/// Canvas surface for a node/edge diagram.
///
/// Holds no graph data of its own: it draws `nodes` and `edges` and reports
/// every user interaction through the callbacks.
#[component]
pub fn FlowCanvas(
	#[prop(into)] nodes: Signal<Vec<Node>>,
	#[prop(into)] edges: Signal<Vec<Edge>>,
	#[prop(into)] on_nodes_change: Callback<Vec<NodeChange>>,
	#[prop(into)] on_edges_change: Callback<Vec<EdgeChange>>,
	#[prop(into)] on_connect: Callback<Connection>,
	#[prop(into)] on_node_click: Callback<NodeId>,
	#[prop(default = true)] fit_view: bool,
	#[prop(default = true)] minimap: bool,
	#[prop(default = true)] controls: bool,
	#[prop(default = 16.0)] background_gap: f64,
	#[prop(default = "#aaa")] background_color: &'static str,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Shared<SurfaceState> = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let frame: FrameId = Rc::new(Cell::new(None));
	let (state_init, animate_init, resize_cb_init, frame_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), frame.clone());
	let options = CanvasOptions {
		minimap,
		background_gap,
		background_color: background_color.to_string(),
	};

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		if let Err(err) = mount_surface(
			canvas,
			state_init.clone(),
			animate_init.clone(),
			resize_cb_init.clone(),
			frame_init.clone(),
			nodes,
			edges,
			options.clone(),
			fit_view,
		) {
			error!("flow canvas setup failed: {err}");
		}
	});

	// Cleanup callbacks must be Send; the surface only ever lives on the main thread.
	let teardown = SendWrapper::new((state.clone(), animate.clone(), resize_cb.clone(), frame));
	on_cleanup(move || {
		let (state, animate, resize_cb, frame) = teardown.take();
		unmount_surface(state, animate, resize_cb, frame);
	});

	let emit = move |(node_changes, edge_changes): (Vec<NodeChange>, Vec<EdgeChange>)| {
		if !node_changes.is_empty() {
			on_nodes_change.run(node_changes);
		}
		if !edge_changes.is_empty() {
			on_edges_change.run(edge_changes);
		}
	};

	let pointer = move |ev: &MouseEvent| -> Option<(f64, f64)> {
		let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
		let rect = canvas.get_bounding_client_rect();
		Some((
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		))
	};

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(&ev) else {
			return;
		};
		let mut selection = None;
		if let Some(ref mut s) = *state_md.borrow_mut() {
			let (gx, gy) = s.screen_to_graph(x, y);
			match with_graph(nodes, edges, |ns, es| state::hit_test(ns, es, gx, gy)) {
				Some(Hit::SourceHandle(id)) => s.begin_connect(id, x, y),
				Some(Hit::Node(id)) => {
					let start =
						nodes.with_untracked(|ns| ns.iter().find(|n| n.id == id).map(|n| n.position));
					if let Some(start) = start {
						s.begin_drag(id, start, x, y);
					}
				}
				Some(Hit::Edge(id)) => {
					selection = Some(with_graph(nodes, edges, |ns, es| {
						state::select_only_edge(ns, es, &id)
					}));
				}
				None => s.begin_pan(x, y),
			}
		}
		if let Some(changes) = selection {
			emit(changes);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(&ev) else {
			return;
		};
		let mut moved = None;
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			// Update hover state when no gesture is running
			if !s.is_busy() {
				let (gx, gy) = s.screen_to_graph(x, y);
				s.hover = nodes.with_untracked(|ns| state::node_at(ns, gx, gy).map(|n| n.id.clone()));
			}

			if s.connect.is_some() {
				s.connect_to(x, y);
			} else if s.drag.node.is_some() {
				moved = s.drag_to(x, y);
			} else {
				s.pan_to(x, y);
			}
		}
		if let Some((id, position)) = moved {
			on_nodes_change.run(vec![NodeChange::Position { id, position }]);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let released = match *state_mu.borrow_mut() {
			Some(ref mut s) => s.release(),
			None => Release::Nothing,
		};
		match released {
			Release::NodeClick(id) => {
				emit(with_graph(nodes, edges, |ns, es| {
					state::select_only_node(ns, es, &id)
				}));
				on_node_click.run(id);
			}
			Release::Connect { source, x, y } => {
				match nodes.with_untracked(|ns| state::node_at(ns, x, y).map(|n| n.id.clone())) {
					Some(target) => on_connect.run(Connection { source, target }),
					None => debug!("connection from {source} dropped on the pane"),
				}
			}
			Release::PaneClick => emit(with_graph(nodes, edges, state::clear_selection)),
			Release::Nothing => {}
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.cancel_gestures();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(&*ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(x, y, factor);
		}
	};

	let on_keydown = move |ev: KeyboardEvent| {
		if !matches!(ev.key().as_str(), "Backspace" | "Delete") {
			return;
		}
		ev.prevent_default();
		emit(with_graph(nodes, edges, state::remove_selected));
	};

	let state_zi = state.clone();
	let zoom_in = move |_| {
		if let Some(ref mut s) = *state_zi.borrow_mut() {
			s.zoom_by(ZOOM_STEP);
		}
	};
	let state_zo = state.clone();
	let zoom_out = move |_| {
		if let Some(ref mut s) = *state_zo.borrow_mut() {
			s.zoom_by(1.0 / ZOOM_STEP);
		}
	};
	let state_fit = state.clone();
	let fit = move |_| {
		if let Some(ref mut s) = *state_fit.borrow_mut() {
			nodes.with_untracked(|ns| s.fit_view(ns));
		}
	};

	view! {
		<div class="flow-canvas">
			<canvas
				node_ref=canvas_ref
				class="flow-canvas__surface"
				tabindex="0"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:keydown=on_keydown
				style="display: block; cursor: grab; outline: none;"
			/>
			{controls
				.then(|| {
					view! {
						<div class="flow-controls">
							<button title="zoom in" on:click=zoom_in>"+"</button>
							<button title="zoom out" on:click=zoom_out>"-"</button>
							<button title="fit view" on:click=fit>"fit"</button>
						</div>
					}
				})}
		</div>
	}
}
