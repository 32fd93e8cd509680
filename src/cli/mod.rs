pub mod commands;
pub mod runtime;
pub mod search;
pub mod serve;
pub mod watch;

pub use commands::{Cli, Commands};
