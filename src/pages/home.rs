use leptos::prelude::*;
use log::warn;

use crate::components::edit_modal::EditModal;
use crate::components::flow_canvas::FlowCanvas;
use crate::graph::{Connection, EdgeChange, GraphStore, NodeChange, NodeId};

/// Default Home Page: the task diagram and its edit form.
#[component]
pub fn Home() -> impl IntoView {
	// The one store for this page session; everything below reads or updates it.
	let store = RwSignal::new(GraphStore::seeded());

	let nodes = Memo::new(move |_| store.with(|s| s.nodes().to_vec()));
	let edges = Memo::new(move |_| store.with(|s| s.edges().to_vec()));
	let editing = Memo::new(move |_| store.with(GraphStore::is_editing));
	let draft_label = Memo::new(move |_| {
		store.with(|s| s.draft().map(|d| d.label.clone()).unwrap_or_default())
	});

	let on_nodes_change = Callback::new(move |changes: Vec<NodeChange>| {
		store.update(|s| s.on_nodes_change(changes));
	});
	let on_edges_change = Callback::new(move |changes: Vec<EdgeChange>| {
		store.update(|s| s.on_edges_change(changes));
	});
	let on_connect = Callback::new(move |connection: Connection| {
		store.update(|s| {
			if let Err(err) = s.connect(connection) {
				warn!("connection rejected: {err}");
			}
		});
	});
	let on_node_click = Callback::new(move |id: NodeId| {
		store.update(|s| {
			s.select_node(&id);
		});
	});

	let on_label_input = Callback::new(move |label: String| {
		store.update(|s| s.set_draft_label(label));
	});
	let on_save = Callback::new(move |_: ()| {
		store.update(|s| {
			s.save_edit();
		});
	});
	let on_cancel = Callback::new(move |_: ()| store.update(GraphStore::cancel_edit));

	let add_task = move |_| {
		store.update(|s| {
			s.add_node();
		});
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="editor">
				<header class="editor__header">
					<h1>"Diagram flow chart"</h1>
					<p class="subtitle">"Visualize and manage task dependencies"</p>
					<button class="btn btn--primary" on:click=add_task>
						"Add New"
					</button>
				</header>

				<div class="editor__canvas">
					<FlowCanvas
						nodes=nodes
						edges=edges
						on_nodes_change=on_nodes_change
						on_edges_change=on_edges_change
						on_connect=on_connect
						on_node_click=on_node_click
					/>
				</div>

				<EditModal
					open=editing
					label=draft_label
					on_label_input=on_label_input
					on_save=on_save
					on_cancel=on_cancel
				/>
			</div>
		</ErrorBoundary>
	}
}
