//! Change descriptors emitted by the canvas and the reducers that fold them
//! into the node and edge collections.

use super::types::{Edge, EdgeId, Node, NodeId, Position};

/// One node-level interaction reported by the canvas.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeChange {
	/// Append a node.
	Add(Node),
	/// Drop the node with this id.
	Remove(NodeId),
	/// Move a node to a new graph-space position.
	Position {
		/// Node being moved.
		id: NodeId,
		/// New top-left corner.
		position: Position,
	},
	/// Toggle the selection flag of a node.
	Select {
		/// Node being (de)selected.
		id: NodeId,
		/// New flag value.
		selected: bool,
	},
}

/// One edge-level interaction reported by the canvas.
#[derive(Clone, Debug, PartialEq)]
pub enum EdgeChange {
	/// Append an edge.
	Add(Edge),
	/// Drop the edge with this id.
	Remove(EdgeId),
	/// Toggle the selection flag of an edge.
	Select {
		/// Edge being (de)selected.
		id: EdgeId,
		/// New flag value.
		selected: bool,
	},
}

/// Folds `changes` into `nodes` in order and returns the new collection.
///
/// Changes naming an id that is not present are skipped.
pub fn apply_node_changes(changes: Vec<NodeChange>, mut nodes: Vec<Node>) -> Vec<Node> {
	for change in changes {
		match change {
			NodeChange::Add(node) => nodes.push(node),
			NodeChange::Remove(id) => nodes.retain(|n| n.id != id),
			NodeChange::Position { id, position } => {
				if let Some(node) = nodes.iter_mut().find(|n| n.id == id) {
					node.position = position;
				}
			}
			NodeChange::Select { id, selected } => {
				if let Some(node) = nodes.iter_mut().find(|n| n.id == id) {
					node.selected = selected;
				}
			}
		}
	}
	nodes
}

/// Folds `changes` into `edges` in order and returns the new collection.
pub fn apply_edge_changes(changes: Vec<EdgeChange>, mut edges: Vec<Edge>) -> Vec<Edge> {
	for change in changes {
		match change {
			EdgeChange::Add(edge) => edges.push(edge),
			EdgeChange::Remove(id) => edges.retain(|e| e.id != id),
			EdgeChange::Select { id, selected } => {
				if let Some(edge) = edges.iter_mut().find(|e| e.id == id) {
					edge.selected = selected;
				}
			}
		}
	}
	edges
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::TaskData;

	fn node(id: &str, x: f64) -> Node {
		Node::new(id, Position::new(x, 0.0), TaskData::labelled(id))
	}

	#[test]
	fn position_change_moves_only_the_named_node() {
		let nodes = vec![node("a", 0.0), node("b", 10.0)];
		let out = apply_node_changes(
			vec![NodeChange::Position {
				id: "b".into(),
				position: Position::new(42.0, 7.0),
			}],
			nodes,
		);
		assert_eq!(out[0].position, Position::new(0.0, 0.0));
		assert_eq!(out[1].position, Position::new(42.0, 7.0));
	}

	#[test]
	fn changes_apply_in_order() {
		let out = apply_node_changes(
			vec![
				NodeChange::Add(node("c", 5.0)),
				NodeChange::Select {
					id: "c".into(),
					selected: true,
				},
				NodeChange::Remove("a".into()),
			],
			vec![node("a", 0.0)],
		);
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].id.as_str(), "c");
		assert!(out[0].selected);
	}

	#[test]
	fn unknown_ids_are_skipped() {
		let nodes = vec![node("a", 0.0)];
		let out = apply_node_changes(
			vec![
				NodeChange::Remove("zz".into()),
				NodeChange::Position {
					id: "zz".into(),
					position: Position::new(1.0, 1.0),
				},
			],
			nodes.clone(),
		);
		assert_eq!(out, nodes);
	}

	#[test]
	fn edge_select_and_remove() {
		let edges = vec![Edge::new("e1", "1", "2"), Edge::new("e2", "2", "3")];
		let out = apply_edge_changes(
			vec![
				EdgeChange::Select {
					id: "e2".into(),
					selected: true,
				},
				EdgeChange::Remove("e1".into()),
			],
			edges,
		);
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].id.as_str(), "e2");
		assert!(out[0].selected);
	}
}
