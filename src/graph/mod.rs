//! In-memory task graph: nodes, edges and the label editor state.
//!
//! Everything in here is plain Rust with no DOM access, so the whole mutation
//! contract runs under native `cargo test`.

mod changes;
mod editor;
mod error;
mod store;
mod types;

pub use changes::{EdgeChange, NodeChange, apply_edge_changes, apply_node_changes};
pub use editor::{Draft, EditorMode};
pub use error::GraphError;
pub use store::GraphStore;
pub use types::{Connection, Edge, EdgeId, Node, NodeId, Position, TaskData};
