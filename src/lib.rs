pub mod api;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod format;
pub mod tui;
pub mod types;
