use thiserror::Error;

/// Presentation settings fixed at mount time.
#[derive(Clone, Debug)]
pub struct CanvasOptions {
	pub minimap: bool,
	pub background_gap: f64,
	pub background_color: String,
}

impl Default for CanvasOptions {
	fn default() -> Self {
		Self {
			minimap: true,
			background_gap: 16.0,
			background_color: "#aaa".into(),
		}
	}
}

#[derive(Error, Debug)]
pub enum SurfaceError {
	#[error("no browser window")]
	NoWindow,
	#[error("2d context unavailable")]
	NoContext,
	#[error("failed to acquire 2d context: {0}")]
	Context(String),
}
