//! Command implementations, one module per subcommand.

pub mod add;
pub mod completions;
pub mod diff;
pub mod info;
pub mod init;
pub mod list;
