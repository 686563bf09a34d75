use thiserror::Error;

use super::types::NodeId;

/// Rejections raised by the graph store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
	/// An edge endpoint does not name a node in the store.
	#[error("unknown node: {0}")]
	UnknownNode(NodeId),
}
