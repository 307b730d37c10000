//! Terminal output for the command-line interface.
//!
//! Colored status lines for `doctor`, a spinner while the engine thinks and
//! a table for the game listing. None of this is used by the MCP server,
//! whose stdout belongs to the protocol.

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::coach::FileListReport;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Warning,
    Error,
    Info,
    Skipped,
}

/// Status icons for different outcomes.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Warning => "⚠",
        Status::Error => "✗",
        Status::Info => "ℹ",
        Status::Skipped => "○",
    }
}

/// A status line with a colored icon, or a plain one when `color` is off.
pub fn status_line(status: Status, msg: &str, color: bool) -> String {
    let icon = status_icon(status);
    if !color {
        return format!("{} {}", icon, msg);
    }
    match status {
        Status::Success => format!("{} {}", icon.green().bold(), msg),
        Status::Warning => format!("{} {}", icon.yellow().bold(), msg),
        Status::Error => format!("{} {}", icon.red().bold(), msg),
        Status::Info => format!("{} {}", icon.cyan().bold(), msg),
        Status::Skipped => format!("{} {}", icon.white().dimmed(), msg.dimmed()),
    }
}

/// Print a section header.
pub fn section_header(title: &str, color: bool) -> String {
    let header = format!("━━━ {} ━━━", title);
    if color {
        header.bold().cyan().to_string()
    } else {
        header
    }
}

/// Banner shown when the server starts in HTTP mode.
pub fn banner(addr: &str) -> String {
    let version = env!("CARGO_PKG_VERSION");
    [
        String::new(),
        format!("  ⚫⚪ KataGo MCP v{}", version),
        format!("  Listening on http://{}", addr),
        "  Tools: list_sgf_files, get_board_state, analyze_position,".to_string(),
        "         get_move_recommendation, get_territory_analysis, evaluate_move".to_string(),
        String::new(),
    ]
    .join("\n")
}

/// Table of SGF files, newest first.
pub fn file_table(report: &FileListReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "File", "Modified"]);

    for (i, file) in report.files.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            file.relative_path.clone(),
            file.modified.clone(),
        ]);
    }
    table
}

/// Spinner on stderr while waiting for the engine.
///
/// Hidden when stdout is not a terminal, so piped output stays clean.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        if !is_terminal() {
            return Self {
                pb: indicatif::ProgressBar::hidden(),
            };
        }

        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(Self::style("{spinner:.cyan} {msg}", "⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    fn style(template: &str, ticks: &str) -> indicatif::ProgressStyle {
        indicatif::ProgressStyle::with_template(template)
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
            .tick_chars(ticks)
    }

    /// Set the message.
    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.set_style(Self::style("{spinner:.green} {msg}", "✓✓"));
        self.pb.finish_with_message(msg.to_string());
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.set_style(Self::style("{spinner:.red} {msg}", "✗✗"));
        self.pb.finish_with_message(msg.to_string());
    }

    /// Remove the spinner from the terminal.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::FileEntry;

    #[test]
    fn test_status_icon() {
        assert_eq!(status_icon(Status::Success), "✓");
        assert_eq!(status_icon(Status::Warning), "⚠");
        assert_eq!(status_icon(Status::Error), "✗");
        assert_eq!(status_icon(Status::Skipped), "○");
    }

    #[test]
    fn test_plain_status_line() {
        assert_eq!(
            status_line(Status::Error, "Model not found", false),
            "✗ Model not found"
        );
        assert_eq!(section_header("Engine", false), "━━━ Engine ━━━");
    }

    #[test]
    fn test_colored_status_line_keeps_text() {
        let line = status_line(Status::Success, "Executable found", true);
        assert!(line.contains("Executable found"));
        assert!(line.contains('\u{1b}'));
    }

    #[test]
    fn test_file_table() {
        let report = FileListReport {
            directory: "/games".into(),
            total: 1,
            files: vec![FileEntry {
                relative_path: "2024/game.sgf".into(),
                path: "/games/2024/game.sgf".into(),
                modified: "2024-05-01 12:00".into(),
            }],
            text: String::new(),
        };
        let rendered = file_table(&report).to_string();
        assert!(rendered.contains("2024/game.sgf"));
        assert!(rendered.contains("2024-05-01 12:00"));
    }
}
