//! Editor configuration and persisted session state

pub mod editor;
pub mod state;

pub use editor::EditorConfig;
pub use state::EditorState;
