pub mod edit_modal;
pub mod flow_canvas;
