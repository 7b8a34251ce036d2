//! Console reporter.
//!
//! Renders pipeline progress on stderr so stdout stays free for command
//! output. On a terminal the download line is redrawn in place; otherwise
//! only its start is printed.

use std::io::{IsTerminal, Write};
use std::sync::{Mutex, PoisonError};

use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};

use super::theme::{Icons, format_size, percent};
use tapkit_core::Reporter;
use tapkit_schema::{ToolName, Version};

/// [`Reporter`] printing to stderr.
#[derive(Debug)]
pub struct ConsoleReporter {
    icons: Icons,
    interactive: bool,
    progress: Mutex<Progress>,
}

#[derive(Debug, Default)]
struct Progress {
    /// A progress line is on screen without a trailing newline.
    drawn: bool,
    last_percent: Option<u64>,
    announced: bool,
}

impl ConsoleReporter {
    /// Reporter that redraws progress only when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            icons: Icons::default(),
            interactive: std::io::stderr().is_terminal(),
            progress: Mutex::new(Progress::default()),
        }
    }

    fn progress(&self) -> std::sync::MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Print one line, first clearing any progress line in the way.
    fn line(&self, text: &str) {
        let mut progress = self.progress();
        let mut err = std::io::stderr().lock();
        if progress.drawn {
            let _ = queue!(err, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine));
            progress.drawn = false;
        }
        let _ = writeln!(err, "{text}");
        let _ = err.flush();
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        self.line(&format!("\n{}", title.bold()));
    }

    fn downloading(&self, name: &ToolName, version: &Version, current: u64, total: Option<u64>) {
        let mut progress = self.progress();

        if !self.interactive {
            if !progress.announced {
                progress.announced = true;
                drop(progress);
                let size = total.map(format_size).unwrap_or_default();
                self.line(&format!(
                    "  {} {} {} {}",
                    self.icons.active.cyan(),
                    name.as_str(),
                    version.as_str().dark_grey(),
                    format!("fetching {size}").trim_end().dark_grey()
                ));
            }
            return;
        }

        let pct = percent(current, total);
        if progress.drawn && pct.is_some() && pct == progress.last_percent {
            return;
        }
        progress.last_percent = pct;
        progress.drawn = true;

        let amount = match (total, pct) {
            (Some(t), Some(p)) => format!("{} / {} ({p}%)", format_size(current), format_size(t)),
            _ => format_size(current),
        };
        let mut err = std::io::stderr().lock();
        let _ = queue!(err, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = write!(
            err,
            "  {} {} {} {}",
            self.icons.active.cyan(),
            name.as_str(),
            version.as_str().dark_grey(),
            amount.dark_grey()
        );
        let _ = err.flush();
    }

    fn installing(&self, name: &ToolName, version: &Version) {
        self.line(&format!(
            "  {} {} {} {}",
            self.icons.active.cyan(),
            name.as_str(),
            version.as_str().dark_grey(),
            "installing".dark_grey()
        ));
    }

    fn done(&self, name: &ToolName, version: &Version, detail: &str, size: Option<u64>) {
        let size = size.map(|s| format!(" ({})", format_size(s))).unwrap_or_default();
        self.line(&format!(
            "\n{} {} {} {}{}",
            self.icons.success.green(),
            name.as_str().green().bold(),
            version.as_str().green(),
            detail,
            size.dark_grey()
        ));
    }

    fn failed(&self, name: &ToolName, version: &Version, reason: &str) {
        self.line(&format!(
            "{} {} {} {}",
            self.icons.error.red(),
            name.as_str().red().bold(),
            version.as_str().red(),
            reason.red()
        ));
    }

    fn info(&self, msg: &str) {
        self.line(&format!("{} {}", self.icons.info.dark_grey(), msg));
    }

    fn warning(&self, msg: &str) {
        self.line(&format!("{} {}", self.icons.warning.yellow(), msg.yellow()));
    }
}
