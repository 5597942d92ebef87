pub mod action;
pub mod api;
pub mod app;
pub mod cli;
pub mod coerce;
pub mod components;
pub mod config;
pub mod identity;
pub mod mode;
pub mod query;
pub mod schema;
pub mod session;
pub mod theme;
pub mod tui;
pub mod utils;
