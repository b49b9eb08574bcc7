//! Terminal output for sync progress.
//!
//! `TerminalReporter` is the CLI's implementation of the engine's
//! `Reporter` trait. Regular output goes to stdout; warnings and errors go
//! to stderr so they survive `--quiet` and output redirection.

use crossterm::style::Stylize;
use graft_core::paths::path_key;
use graft_core::{FileDiffResult, Reporter, SyncAction, SyncOutcome};

use super::theme::Theme;

/// Width of the status label column
const LABEL_WIDTH: usize = 11;

/// Prints engine events to the terminal.
#[derive(Debug, Clone, Default)]
pub struct TerminalReporter {
    quiet: bool,
    theme: Theme,
}

impl TerminalReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            theme: Theme::default(),
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Print a success line (suppressed by `--quiet`)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", self.theme.icons.success.with(self.theme.colors.success));
        }
    }
}

impl Reporter for TerminalReporter {
    fn section(&self, title: &str) {
        if !self.quiet {
            println!();
            println!("{}", title.with(self.theme.colors.header).bold());
        }
    }

    fn file_outcome(&self, outcome: &SyncOutcome) {
        let line = outcome_line(&self.theme, outcome);
        match outcome.action {
            SyncAction::Failed(_) => eprintln!("{line}"),
            SyncAction::SkippedConflict => println!("{line}"),
            _ if !self.quiet => println!("{line}"),
            _ => {}
        }
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", self.theme.icons.info.with(self.theme.colors.secondary));
        }
    }

    fn warning(&self, msg: &str) {
        eprintln!("  {} {msg}", self.theme.icons.warning.with(self.theme.colors.warning));
    }
}

/// One line for a sync outcome: icon, action, path, owning item
pub fn outcome_line(theme: &Theme, outcome: &SyncOutcome) -> String {
    let (icon, color) = theme.action_style(&outcome.action);
    let label = format!("{:<LABEL_WIDTH$}", outcome.action.label());
    let mut line = format!(
        "  {} {} {} {}",
        icon.with(color),
        label.with(color),
        path_key(&outcome.path),
        outcome.owner.as_str().with(theme.colors.secondary),
    );
    if let SyncAction::Failed(failure) = &outcome.action {
        line.push_str(&format!("\n      {}", failure.to_string().with(theme.colors.error)));
    }
    line
}

/// One line for a diff result; `force` marks conflicts `add --force` would overwrite
pub fn diff_line(theme: &Theme, result: &FileDiffResult, force: bool) -> String {
    let (icon, color) = theme.diff_style(result.status);
    let label = format!("{:<LABEL_WIDTH$}", result.status.as_str());
    let mut line = format!(
        "  {} {} {} {}",
        icon.with(color),
        label.with(color),
        path_key(&result.path),
        result.owner.as_str().with(theme.colors.secondary),
    );

    if let Some(error) = &result.read_error {
        line.push_str(&format!("\n      {}", error.to_string().with(theme.colors.error)));
    } else if force && result.status == graft_core::DiffStatus::Conflict {
        line.push_str(&format!(" {}", "(would overwrite)".with(theme.colors.warning)));
    }
    line
}
