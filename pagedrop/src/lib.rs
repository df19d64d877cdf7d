pub mod auth;
pub mod cli;
pub mod client;
pub mod load_config;
pub mod object_store;
pub mod render;

pub use cli::{run, Cli, Commands};
