pub mod cli;
pub mod client;
pub mod load_config;
pub mod token;
pub mod transport;
pub mod vault;

pub use cli::{run, Cli, Commands};
