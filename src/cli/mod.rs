pub mod commands;

pub use commands::{ClearTarget, Cli, Commands};
