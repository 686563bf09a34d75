use super::types::{NodeId, TaskData};

/// Edit buffer shown in the modal before it is committed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Draft {
	/// Pending label.
	pub label: String,
	/// Pending status, carried through untouched by the label input.
	pub status: Option<String>,
}

impl Draft {
	pub(super) fn from_data(data: &TaskData) -> Self {
		Self {
			label: data.label.clone(),
			status: data.status.clone(),
		}
	}

	pub(super) fn into_data(self) -> TaskData {
		TaskData {
			label: self.label,
			status: self.status,
		}
	}
}

/// Whether the label editor is open, and for which node.
///
/// The modal is visible exactly when this is `Editing`, so a selection without
/// an open form (or the reverse) cannot be represented.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EditorMode {
	/// No node is being edited.
	#[default]
	Idle,
	/// The modal is open on `node_id`.
	Editing {
		/// Node whose data the draft will replace.
		node_id: NodeId,
		/// Current contents of the form.
		draft: Draft,
	},
}

impl EditorMode {
	/// True while the modal is open.
	pub fn is_editing(&self) -> bool {
		matches!(self, Self::Editing { .. })
	}

	/// Id of the node under edit.
	pub fn node_id(&self) -> Option<&NodeId> {
		match self {
			Self::Idle => None,
			Self::Editing { node_id, .. } => Some(node_id),
		}
	}

	/// The form contents, if open.
	pub fn draft(&self) -> Option<&Draft> {
		match self {
			Self::Idle => None,
			Self::Editing { draft, .. } => Some(draft),
		}
	}

	pub(super) fn draft_mut(&mut self) -> Option<&mut Draft> {
		match self {
			Self::Idle => None,
			Self::Editing { draft, .. } => Some(draft),
		}
	}
}
