//! CLI subcommand implementations.

pub mod handle;
pub mod init;
pub mod options;
pub mod probe;
pub mod util;
pub mod watch;
