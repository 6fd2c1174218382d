//! Output formatting and progress reporting

use clap::ValueEnum;
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use webspec::{CaseStatus, RunReport, RunResult};

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON report on stdout
    Json,
}

/// Progress reporter for case execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` cases
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Remove the progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn line(&self, text: &str) {
        match &self.progress_bar {
            Some(pb) => pb.suspend(|| {
                let _ = self.term.write_line(text);
            }),
            None => {
                let _ = self.term.write_line(text);
            }
        }
    }

    fn tagged(&self, symbol: &str, plain: &str, color: Style, message: &str) -> String {
        let prefix = if self.use_color {
            color.bold().apply_to(symbol).to_string()
        } else {
            plain.to_string()
        };
        format!("{prefix} {message}")
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&self.tagged("✓", "PASS", Style::new().green(), message));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        self.line(&self.tagged("✗", "FAIL", Style::new().red(), message));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&self.tagged("⚠", "WARN", Style::new().yellow(), message));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&self.tagged("ℹ", "INFO", Style::new().blue(), message));
    }

    /// Print a dimmed detail line
    pub fn detail(&self, message: &str) {
        let text = if self.use_color {
            style(message).dim().to_string()
        } else {
            message.to_string()
        };
        self.line(&format!("    {text}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.line("");
        self.line(&styled);
    }

    /// Print one case outcome as it finishes
    pub fn case_result(&self, result: &RunResult) {
        let name = result.full_name();
        match result.status {
            CaseStatus::Passed => self.success(&format!("{name} ({}ms)", result.elapsed_ms)),
            CaseStatus::Failed | CaseStatus::TimedOut => {
                self.failure(&format!("{name} [{}] ({}ms)", result.status, result.elapsed_ms));
                if let Some(error) = &result.error {
                    self.detail(&error.message);
                    if let Some(action) = &error.action {
                        self.detail(&format!("at {action}"));
                    }
                }
            }
            CaseStatus::NotRun => self.warning(&format!("{name} (not run)")),
            CaseStatus::Skipped => self.warning(&format!("{name} (skipped)")),
            CaseStatus::Pending | CaseStatus::Running => {}
        }
    }

    /// Print the run summary
    pub fn summary(&self, report: &RunReport) {
        let failed = report.failed() + report.timed_out();
        if self.quiet && failed == 0 {
            return;
        }

        self.line("");
        let seconds = report.elapsed_ms as f64 / 1000.0;
        let counts = format!(
            "{} passed, {} failed, {} timed out, {} not run, {} skipped",
            report.passed(),
            report.failed(),
            report.timed_out(),
            report.not_run(),
            report.skipped()
        );

        let status = if failed > 0 { "FAILED" } else { "PASSED" };
        let status = if self.use_color {
            let color = if failed > 0 {
                Style::new().red().bold()
            } else {
                Style::new().green().bold()
            };
            color.apply_to(status).to_string()
        } else {
            status.to_string()
        };

        self.line(&format!(
            "{status} {} cases in {seconds:.2}s ({counts})",
            report.results.len()
        ));
    }
}

/// Render a report as pretty JSON
///
/// # Errors
///
/// Returns a serialization error, which a well-formed report never produces.
pub fn render_json(report: &RunReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
