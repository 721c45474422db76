pub mod cli;
pub mod input;

pub use cli::{Cli, Commands};
