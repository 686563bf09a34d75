use task_flow_editor::graph::{Connection, EditorMode, GraphStore, NodeChange, Position};

fn label(store: &GraphStore, id: &str) -> String {
	store
		.node(&id.into())
		.map(|n| n.data.label.clone())
		.expect("node exists")
}

#[test]
fn rename_sugarcane_end_to_end() {
	let mut store = GraphStore::seeded();

	assert!(store.select_node(&"2".into()));
	assert_eq!(store.draft().map(|d| d.label.as_str()), Some("Sugarcane"));

	store.set_draft_label("Sugarcane Farm");
	assert!(store.save_edit());

	assert_eq!(label(&store, "2"), "Sugarcane Farm");
	assert_eq!(label(&store, "1"), "Cow");
	assert_eq!(label(&store, "3"), "Tree");
	assert!(!store.is_editing());
	assert!(store.selected().is_none());
}

#[test]
fn drag_connect_and_delete_session() {
	let mut store = GraphStore::seeded();
	let added = store.add_node();

	store.on_nodes_change(vec![NodeChange::Position {
		id: added.clone(),
		position: Position::new(250.0, 300.0),
	}]);
	store
		.connect(Connection::new("1", added.clone()))
		.expect("connect to new task");
	store
		.connect(Connection::new("2", "3"))
		.expect("connect seeds");
	assert_eq!(store.edges().len(), 2);

	store.select_node(&added);
	store.on_nodes_change(vec![NodeChange::Remove(added.clone())]);

	assert_eq!(store.mode(), &EditorMode::Idle);
	assert_eq!(store.nodes().len(), 3);
	assert_eq!(store.edges().len(), 1);
	assert!(store.edges().iter().all(|e| !e.touches(&added)));
}
