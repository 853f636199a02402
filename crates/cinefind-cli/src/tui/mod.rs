//! TUI module for the interactive search screen.
//!
//! Uses `ratatui` + `crossterm` for rendering.

mod search_screen;
/// Search screen state types.
pub mod state;
mod ui;

pub use search_screen::run_search_screen;
