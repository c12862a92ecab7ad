pub mod config;
pub mod connections;
pub mod error;
pub mod types;
