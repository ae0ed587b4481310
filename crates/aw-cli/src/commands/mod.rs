//! Long-running commands.

mod serve;

pub use serve::{run_server, ServeConfig};
