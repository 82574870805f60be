// Terminal UI implementation using ratatui

pub mod app;
pub mod runner;
pub mod ui;

pub use app::{Action, App, DateField, InputMode};
pub use runner::run_tui;
