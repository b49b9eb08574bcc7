//! Terminal presentation: theme, per-file lines and tables.

pub mod list;
pub mod output;
pub mod theme;

pub use output::TerminalReporter;
pub use theme::Theme;
