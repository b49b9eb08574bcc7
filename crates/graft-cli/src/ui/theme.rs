//! UI Theme - colors and icons
//!
//! Every command styles its output through this module so `add`, `diff` and
//! `info` agree on what a status looks like.

use crossterm::style::Color;
use graft_core::{DiffStatus, SyncAction};

/// Default theme for graft output
#[derive(Debug, Clone, Default)]
pub struct Theme {
    /// Colors for different UI elements
    pub colors: ColorScheme,
    /// Status icons
    pub icons: Icons,
}

/// Color scheme for UI elements
#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Item names (primary content)
    pub item_name: Color,
    /// Paths and secondary info
    pub secondary: Color,
    /// Headers and labels
    pub header: Color,
    /// Success states
    pub success: Color,
    /// Warning states
    pub warning: Color,
    /// Error states
    pub error: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            item_name: Color::Cyan,
            secondary: Color::DarkGrey,
            header: Color::DarkGrey,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
        }
    }
}

/// Status icons for different states
#[derive(Debug, Clone)]
pub struct Icons {
    /// Nothing to do (○)
    pub idle: &'static str,
    /// Pending change (+)
    pub pending: &'static str,
    /// Success/completed state (✓)
    pub success: &'static str,
    /// Error/failed state (✗)
    pub error: &'static str,
    /// Warning state (⚠)
    pub warning: &'static str,
    /// Info/Tip state (ℹ)
    pub info: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            idle: "○",
            pending: "+",
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
        }
    }
}

impl Theme {
    /// Icon and color for a diff status
    pub fn diff_style(&self, status: DiffStatus) -> (&'static str, Color) {
        match status {
            DiffStatus::Create | DiffStatus::Update => (self.icons.pending, self.colors.success),
            DiffStatus::Identical => (self.icons.idle, self.colors.secondary),
            DiffStatus::Conflict => (self.icons.warning, self.colors.warning),
        }
    }

    /// Icon and color for a sync action
    pub fn action_style(&self, action: &SyncAction) -> (&'static str, Color) {
        match action {
            SyncAction::Created | SyncAction::Updated | SyncAction::Overwritten => {
                (self.icons.success, self.colors.success)
            }
            SyncAction::Unchanged => (self.icons.idle, self.colors.secondary),
            SyncAction::SkippedConflict => (self.icons.warning, self.colors.warning),
            SyncAction::Failed(_) => (self.icons.error, self.colors.error),
        }
    }
}

/// Pluralize a count: `plural(1, "file")` -> "1 file"
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
