pub mod api;
pub mod cli;
pub mod generator;
pub mod tui;
