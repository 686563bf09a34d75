use std::fmt;

/// Identifier of a node, stable for the node's lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

/// Identifier of an edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(String);

macro_rules! string_id {
	($ty:ident) => {
		impl $ty {
			/// Wraps a raw id string.
			pub fn new(value: impl Into<String>) -> Self {
				Self(value.into())
			}

			/// The raw id string.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl fmt::Display for $ty {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<&str> for $ty {
			fn from(value: &str) -> Self {
				Self::new(value)
			}
		}

		impl From<String> for $ty {
			fn from(value: String) -> Self {
				Self(value)
			}
		}
	};
}

string_id!(NodeId);
string_id!(EdgeId);

/// Top-left corner of a node in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	/// Horizontal offset.
	pub x: f64,
	/// Vertical offset.
	pub y: f64,
}

impl Position {
	/// Shorthand constructor.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// User-editable payload of a node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskData {
	/// Text shown inside the node.
	pub label: String,
	/// Free-form status, absent until someone sets one.
	pub status: Option<String>,
}

impl TaskData {
	/// Data with a label and no status.
	pub fn labelled(label: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			status: None,
		}
	}
}

/// A draggable task in the diagram.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Unique id.
	pub id: NodeId,
	/// Graph-space position.
	pub position: Position,
	/// Label and status.
	pub data: TaskData,
	/// Whether the surface currently shows the node as selected.
	pub selected: bool,
}

impl Node {
	/// An unselected node.
	pub fn new(id: impl Into<NodeId>, position: Position, data: TaskData) -> Self {
		Self {
			id: id.into(),
			position,
			data,
			selected: false,
		}
	}
}

/// A directed dependency between two nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	/// Unique id.
	pub id: EdgeId,
	/// Node the edge starts at.
	pub source: NodeId,
	/// Node the edge points to.
	pub target: NodeId,
	/// Whether the surface currently shows the edge as selected.
	pub selected: bool,
}

impl Edge {
	/// An unselected edge.
	pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
		Self {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			selected: false,
		}
	}

	/// Whether either end of the edge is `node`.
	pub fn touches(&self, node: &NodeId) -> bool {
		&self.source == node || &self.target == node
	}
}

/// Endpoints picked by a connect gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
	/// Node the gesture started on.
	pub source: NodeId,
	/// Node the gesture was released on.
	pub target: NodeId,
}

impl Connection {
	/// Shorthand constructor.
	pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}
