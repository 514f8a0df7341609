pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod geo;
pub mod map;
pub mod models;
pub mod observability;
pub mod state;
pub mod stats;
