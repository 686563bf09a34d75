//! The single owner of the diagram state.

use std::collections::HashSet;

use log::{debug, warn};

use super::changes::{EdgeChange, NodeChange, apply_edge_changes, apply_node_changes};
use super::editor::{Draft, EditorMode};
use super::error::GraphError;
use super::types::{Connection, Edge, EdgeId, Node, NodeId, Position, TaskData};

/// Extent of the square new nodes are scattered over.
const SCATTER_EXTENT: f64 = 500.0;

const SEED_TASKS: &[(&str, f64, f64, &str)] = &[
	("1", 100.0, 100.0, "Cow"),
	("2", 300.0, 100.0, "Sugarcane"),
	("3", 500.0, 100.0, "Tree"),
];

/// Nodes, edges and the editor mode for one page session.
///
/// Ids come from counters that only ever grow, so removing nodes never leads
/// to a reused id.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphStore {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	next_node_id: u64,
	next_edge_id: u64,
	mode: EditorMode,
}

impl Default for GraphStore {
	fn default() -> Self {
		Self::seeded()
	}
}

impl GraphStore {
	/// An empty store.
	pub fn new() -> Self {
		Self {
			nodes: Vec::new(),
			edges: Vec::new(),
			next_node_id: 1,
			next_edge_id: 1,
			mode: EditorMode::Idle,
		}
	}

	/// The three starter tasks and no edges.
	pub fn seeded() -> Self {
		let mut store = Self::new();
		let seeds = SEED_TASKS
			.iter()
			.map(|&(id, x, y, label)| {
				NodeChange::Add(Node::new(id, Position::new(x, y), TaskData::labelled(label)))
			})
			.collect();
		store.on_nodes_change(seeds);
		store
	}

	/// All nodes in insertion order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// All edges in insertion order.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Looks up a node by id.
	pub fn node(&self, id: &NodeId) -> Option<&Node> {
		self.nodes.iter().find(|n| &n.id == id)
	}

	/// Replaces the node collection with the result of folding `changes` into it.
	///
	/// Adds that would repeat an id already in the store (or earlier in the
	/// batch) are dropped. Edges left without an endpoint are dropped with their
	/// node, and an edit in progress on a removed node is abandoned.
	pub fn on_nodes_change(&mut self, changes: Vec<NodeChange>) {
		let mut present: HashSet<NodeId> = self.nodes.iter().map(|n| n.id.clone()).collect();
		let changes: Vec<NodeChange> = changes
			.into_iter()
			.filter(|change| match change {
				NodeChange::Add(node) => {
					if !present.insert(node.id.clone()) {
						warn!("dropped add of duplicate node id {}", node.id);
						return false;
					}
					true
				}
				NodeChange::Remove(id) => {
					present.remove(id);
					true
				}
				_ => true,
			})
			.collect();
		for change in &changes {
			if let NodeChange::Add(node) = change {
				self.reserve_node_id(&node.id);
			}
		}
		let count = changes.len();
		let before: Vec<NodeId> = self.nodes.iter().map(|n| n.id.clone()).collect();
		self.nodes = apply_node_changes(changes, std::mem::take(&mut self.nodes));

		let removed: Vec<NodeId> = before
			.into_iter()
			.filter(|id| self.node(id).is_none())
			.collect();
		if !removed.is_empty() {
			let edges = self.edges.len();
			self.edges.retain(|e| !removed.iter().any(|id| e.touches(id)));
			if self.edges.len() != edges {
				debug!("dropped {} dangling edge(s)", edges - self.edges.len());
			}
		}

		if let Some(id) = self.mode.node_id() {
			if self.node(id).is_none() {
				debug!("node {id} removed while being edited");
				self.mode = EditorMode::Idle;
			}
		}
		debug!("applied {count} node change(s), {} node(s)", self.nodes.len());
	}

	/// Replaces the edge collection with the result of folding `changes` into it.
	///
	/// Adds with an endpoint that is not in the store are dropped, as in [`Self::connect`].
	pub fn on_edges_change(&mut self, changes: Vec<EdgeChange>) {
		let changes: Vec<EdgeChange> = changes
			.into_iter()
			.filter(|change| match change {
				EdgeChange::Add(edge) => {
					let known = self.node(&edge.source).is_some() && self.node(&edge.target).is_some();
					if !known {
						warn!("dropped edge {} with unknown endpoint", edge.id);
					}
					known
				}
				_ => true,
			})
			.collect();
		let count = changes.len();
		self.edges = apply_edge_changes(changes, std::mem::take(&mut self.edges));
		debug!("applied {count} edge change(s), {} edge(s)", self.edges.len());
	}

	/// Appends an edge for a finished connect gesture.
	///
	/// Duplicate edges and self-loops are accepted; both endpoints must exist.
	pub fn connect(&mut self, connection: Connection) -> Result<EdgeId, GraphError> {
		for end in [&connection.source, &connection.target] {
			if self.node(end).is_none() {
				warn!("rejected connection to unknown node {end}");
				return Err(GraphError::UnknownNode(end.clone()));
			}
		}
		let id = EdgeId::new(format!("e{}", self.next_edge_id));
		self.next_edge_id += 1;
		debug!("connect {} -> {} as {id}", connection.source, connection.target);
		self.edges.push(Edge::new(id.clone(), connection.source, connection.target));
		Ok(id)
	}

	/// Appends a fresh task at a scattered position and returns its id.
	pub fn add_node(&mut self) -> NodeId {
		let n = self.next_node_id;
		let id = NodeId::new(n.to_string());
		let seed = n.wrapping_mul(2);
		let position = Position::new(
			scatter(seed) * SCATTER_EXTENT,
			scatter(seed.wrapping_add(1)) * SCATTER_EXTENT,
		);
		let label = format!("Task {id}: New Task");
		self.on_nodes_change(vec![NodeChange::Add(Node::new(
			id.clone(),
			position,
			TaskData::labelled(label),
		))]);
		id
	}

	/// Current editor mode.
	pub fn mode(&self) -> &EditorMode {
		&self.mode
	}

	/// True while the edit modal is open.
	pub fn is_editing(&self) -> bool {
		self.mode.is_editing()
	}

	/// The node under edit.
	pub fn selected(&self) -> Option<&Node> {
		self.mode.node_id().and_then(|id| self.node(id))
	}

	/// Form contents while editing.
	pub fn draft(&self) -> Option<&Draft> {
		self.mode.draft()
	}

	/// Opens the editor on `id`, seeding the draft from the node's data.
	///
	/// Replaces any edit already in progress. Returns false if no such node exists.
	pub fn select_node(&mut self, id: &NodeId) -> bool {
		let Some(node) = self.node(id) else {
			warn!("select of unknown node {id}");
			return false;
		};
		self.mode = EditorMode::Editing {
			node_id: node.id.clone(),
			draft: Draft::from_data(&node.data),
		};
		debug!("editing node {id}");
		true
	}

	/// Updates the pending label. Ignored when idle.
	pub fn set_draft_label(&mut self, label: impl Into<String>) {
		if let Some(draft) = self.mode.draft_mut() {
			draft.label = label.into();
		}
	}

	/// Updates the pending status. Ignored when idle.
	pub fn set_draft_status(&mut self, status: Option<String>) {
		if let Some(draft) = self.mode.draft_mut() {
			draft.status = status;
		}
	}

	/// Writes the draft into the node under edit and closes the editor.
	///
	/// Returns true if a node was updated. Idle stores are left untouched.
	pub fn save_edit(&mut self) -> bool {
		let EditorMode::Editing { node_id, draft } = std::mem::take(&mut self.mode) else {
			return false;
		};
		match self.nodes.iter_mut().find(|n| n.id == node_id) {
			Some(node) => {
				node.data = draft.into_data();
				debug!("saved node {node_id}");
				true
			}
			None => false,
		}
	}

	/// Closes the editor without touching any node.
	pub fn cancel_edit(&mut self) {
		self.mode = EditorMode::Idle;
	}

	fn reserve_node_id(&mut self, id: &NodeId) {
		if let Ok(n) = id.as_str().parse::<u64>() {
			self.next_node_id = self.next_node_id.max(n.saturating_add(1));
		}
	}
}

/// Deterministic value in [0, 1) for scattering new nodes.
fn scatter(seed: u64) -> f64 {
	// Reduce first so the multiply stays far below u64::MAX.
	let x = ((seed % 233280 + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	fn label(store: &GraphStore, id: &str) -> String {
		store.node(&id.into()).map(|n| n.data.label.clone()).unwrap_or_default()
	}

	#[test]
	fn seeded_store_has_three_tasks_and_no_edges() {
		let store = GraphStore::seeded();
		let ids: Vec<_> = store.nodes().iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["1", "2", "3"]);
		assert_eq!(label(&store, "1"), "Cow");
		assert_eq!(label(&store, "2"), "Sugarcane");
		assert_eq!(label(&store, "3"), "Tree");
		assert_eq!(store.node(&"2".into()).map(|n| n.position), Some(Position::new(300.0, 100.0)));
		assert!(store.edges().is_empty());
		assert!(!store.is_editing());
	}

	#[rstest]
	#[case(1)]
	#[case(5)]
	#[case(40)]
	fn add_node_grows_by_one_with_unique_ids(#[case] adds: usize) {
		let mut store = GraphStore::seeded();
		for _ in 0..adds {
			store.add_node();
		}
		assert_eq!(store.nodes().len(), 3 + adds);
		let unique: HashSet<_> = store.nodes().iter().map(|n| n.id.clone()).collect();
		assert_eq!(unique.len(), store.nodes().len());
	}

	#[test]
	fn add_node_uses_next_number_and_default_label() {
		let mut store = GraphStore::seeded();
		let id = store.add_node();
		assert_eq!(id.as_str(), "4");
		let node = store.node(&id).expect("added node");
		assert_eq!(node.data.label, "Task 4: New Task");
		assert_eq!(node.data.status, None);
		assert!((0.0..SCATTER_EXTENT).contains(&node.position.x));
		assert!((0.0..SCATTER_EXTENT).contains(&node.position.y));
	}

	#[test]
	fn ids_are_not_reused_after_removal() {
		let mut store = GraphStore::seeded();
		let four = store.add_node();
		store.on_nodes_change(vec![NodeChange::Remove("2".into())]);
		let next = store.add_node();
		assert_ne!(next, four);
		assert_eq!(next.as_str(), "5");
	}

	#[test]
	fn added_numeric_ids_advance_the_counter() {
		let mut store = GraphStore::seeded();
		store.on_nodes_change(vec![NodeChange::Add(Node::new(
			"9",
			Position::default(),
			TaskData::labelled("external"),
		))]);
		assert_eq!(store.add_node().as_str(), "10");
	}

	#[test]
	fn connect_appends_exactly_one_edge() {
		let mut store = GraphStore::seeded();
		let id = store.connect(Connection::new("1", "2")).expect("connect");
		assert_eq!(store.edges().len(), 1);
		let edge = &store.edges()[0];
		assert_eq!(edge.id, id);
		assert_eq!(edge.source.as_str(), "1");
		assert_eq!(edge.target.as_str(), "2");
	}

	#[test]
	fn connect_accepts_duplicates_and_self_loops() {
		let mut store = GraphStore::seeded();
		let a = store.connect(Connection::new("1", "2")).expect("first");
		let b = store.connect(Connection::new("1", "2")).expect("duplicate");
		store.connect(Connection::new("3", "3")).expect("self loop");
		assert_ne!(a, b);
		assert_eq!(store.edges().len(), 3);
	}

	#[test]
	fn connect_rejects_unknown_endpoints() {
		let mut store = GraphStore::seeded();
		let err = store.connect(Connection::new("1", "99")).unwrap_err();
		assert_eq!(err, GraphError::UnknownNode("99".into()));
		assert!(store.edges().is_empty());
	}

	#[test]
	fn removing_a_node_drops_its_edges() {
		let mut store = GraphStore::seeded();
		store.connect(Connection::new("1", "2")).expect("1-2");
		store.connect(Connection::new("2", "3")).expect("2-3");
		store.connect(Connection::new("1", "3")).expect("1-3");
		store.on_nodes_change(vec![NodeChange::Remove("2".into())]);
		assert_eq!(store.edges().len(), 1);
		assert_eq!(store.edges()[0].source.as_str(), "1");
		assert_eq!(store.edges()[0].target.as_str(), "3");
	}

	#[test]
	fn duplicate_node_adds_are_dropped() {
		let mut store = GraphStore::seeded();
		store.on_nodes_change(vec![
			NodeChange::Add(Node::new("2", Position::default(), TaskData::labelled("copy"))),
			NodeChange::Add(Node::new("7", Position::default(), TaskData::labelled("first"))),
			NodeChange::Add(Node::new("7", Position::default(), TaskData::labelled("second"))),
		]);
		let twos = store.nodes().iter().filter(|n| n.id.as_str() == "2").count();
		assert_eq!(twos, 1);
		assert_eq!(label(&store, "2"), "Sugarcane");
		assert_eq!(label(&store, "7"), "first");
		assert_eq!(store.nodes().len(), 4);
	}

	#[test]
	fn id_freed_by_removal_can_be_added_in_the_same_batch() {
		let mut store = GraphStore::seeded();
		store.on_nodes_change(vec![
			NodeChange::Remove("3".into()),
			NodeChange::Add(Node::new("3", Position::default(), TaskData::labelled("Oak"))),
		]);
		assert_eq!(store.nodes().len(), 3);
		assert_eq!(label(&store, "3"), "Oak");
	}

	#[test]
	fn edge_adds_with_unknown_endpoints_are_dropped() {
		let mut store = GraphStore::seeded();
		store.on_edges_change(vec![
			EdgeChange::Add(Edge::new("x", "1", "99")),
			EdgeChange::Add(Edge::new("y", "42", "1")),
			EdgeChange::Add(Edge::new("z", "1", "3")),
		]);
		let ids: Vec<_> = store.edges().iter().map(|e| e.id.as_str()).collect();
		assert_eq!(ids, ["z"]);
	}

	#[rstest]
	#[case("18446744073709551615")]
	#[case("9223372036854775807")]
	#[case("4294967296")]
	fn huge_numeric_ids_do_not_overflow(#[case] id: &str) {
		let mut store = GraphStore::seeded();
		store.on_nodes_change(vec![NodeChange::Add(Node::new(
			id,
			Position::default(),
			TaskData::labelled("big"),
		))]);
		store.add_node();
		assert!(store.nodes().len() >= 4);
		for node in &store.nodes()[3..] {
			assert!((0.0..SCATTER_EXTENT).contains(&node.position.x));
			assert!((0.0..SCATTER_EXTENT).contains(&node.position.y));
		}
	}

	#[test]
	fn scatter_stays_in_unit_range_for_any_seed() {
		for seed in [0, 1, 233_279, 233_280, u64::MAX / 2, u64::MAX] {
			assert!((0.0..1.0).contains(&scatter(seed)));
		}
	}

	#[test]
	fn select_node_copies_data_into_draft() {
		let mut store = GraphStore::seeded();
		assert!(store.select_node(&"2".into()));
		assert!(store.is_editing());
		assert_eq!(store.selected().map(|n| n.id.as_str()), Some("2"));
		assert_eq!(store.draft().map(|d| d.label.as_str()), Some("Sugarcane"));
	}

	#[test]
	fn select_unknown_node_stays_idle() {
		let mut store = GraphStore::seeded();
		assert!(!store.select_node(&"42".into()));
		assert_eq!(store.mode(), &EditorMode::Idle);
	}

	#[test]
	fn save_edit_changes_exactly_one_node() {
		let mut store = GraphStore::seeded();
		let before = store.nodes().to_vec();
		store.select_node(&"1".into());
		store.set_draft_label("Dairy Cow");
		store.set_draft_status(Some("done".into()));
		assert!(store.save_edit());

		for (old, new) in before.iter().zip(store.nodes()) {
			assert_eq!(old.id, new.id);
			assert_eq!(old.position, new.position);
			if old.id.as_str() == "1" {
				assert_eq!(new.data.label, "Dairy Cow");
				assert_eq!(new.data.status.as_deref(), Some("done"));
			} else {
				assert_eq!(old.data, new.data);
			}
		}
		assert!(!store.is_editing());
		assert!(store.selected().is_none());
	}

	#[test]
	fn save_while_idle_is_a_no_op() {
		let mut store = GraphStore::seeded();
		let before = store.clone();
		assert!(!store.save_edit());
		assert_eq!(store, before);
	}

	#[test]
	fn cancel_edit_leaves_data_alone_and_is_idempotent() {
		let mut store = GraphStore::seeded();
		let before = store.nodes().to_vec();
		store.select_node(&"3".into());
		store.set_draft_label("Oak");
		store.cancel_edit();
		let once = store.clone();
		store.cancel_edit();
		assert_eq!(store, once);
		assert_eq!(store.nodes(), before.as_slice());
		assert!(!store.is_editing());
	}

	#[test]
	fn draft_setters_ignored_when_idle() {
		let mut store = GraphStore::seeded();
		store.set_draft_label("ignored");
		assert_eq!(store.draft(), None);
	}

	#[test]
	fn removing_the_edited_node_closes_the_editor() {
		let mut store = GraphStore::seeded();
		store.select_node(&"2".into());
		store.on_nodes_change(vec![NodeChange::Remove("2".into())]);
		assert_eq!(store.mode(), &EditorMode::Idle);
		assert!(!store.save_edit());
	}

	#[test]
	fn reselecting_replaces_the_edit_target() {
		let mut store = GraphStore::seeded();
		store.select_node(&"1".into());
		store.set_draft_label("scratch");
		store.select_node(&"3".into());
		assert_eq!(store.draft().map(|d| d.label.as_str()), Some("Tree"));
		store.save_edit();
		assert_eq!(label(&store, "1"), "Cow");
		assert_eq!(label(&store, "3"), "Tree");
	}
}
