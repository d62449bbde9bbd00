//! Simple Output and Reporting
//!
//! This module renders explanations and batch validation results as human
//! readable text, JSON, or a one-line summary.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{OutputConfig, OutputFormatConfig};
use crate::explain::{Explanation, PathEntry, render_observed};
use crate::validator::{ItemValidationResult, ValidationResults, ValidationStatus};

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show failures
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show per-value detail
    Verbose,
    /// Show all available debugging information
    Debug,
}

impl From<&OutputConfig> for VerbosityLevel {
    fn from(config: &OutputConfig) -> Self {
        if config.quiet {
            VerbosityLevel::Quiet
        } else if config.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output formatter for explanations and validation results
pub struct Output {
    verbosity: VerbosityLevel,
    format: OutputFormatConfig,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            format: OutputFormatConfig::Human,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.into()).with_format(config.format)
    }

    pub fn with_format(mut self, format: OutputFormatConfig) -> Self {
        self.format = format;
        self
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Render a single explanation
    pub fn format_explanation(&self, explanation: &Explanation) -> String {
        match self.format {
            OutputFormatConfig::Json => to_json(explanation),
            OutputFormatConfig::Summary => format!(
                "invalid: {} extra: {}",
                explanation.invalid_paths().len(),
                explanation.extra_paths().len()
            ),
            OutputFormatConfig::Human => self.format_explanation_human(explanation),
        }
    }

    fn format_explanation_human(&self, explanation: &Explanation) -> String {
        if explanation.conforms_exactly() {
            return format!("{}\n", self.colorize("✓ CONFORMS", "32"));
        }

        let mut output = String::new();
        let invalid = explanation.invalid_paths();
        if !invalid.is_empty() {
            output.push_str(&format!("{}\n", self.colorize("✗ INVALID", "31")));
            output.push_str(&self.format_paths(&invalid));
        }

        if self.verbosity > VerbosityLevel::Quiet {
            let extra = explanation.extra_paths();
            if !extra.is_empty() {
                output.push_str(&format!("{}\n", self.colorize("+ EXTRA", "33")));
                output.push_str(&self.format_paths(&extra));
            }
        }

        output
    }

    fn format_paths(&self, paths: &[PathEntry<'_>]) -> String {
        paths
            .iter()
            .map(|(path, value)| format!("    {}: {}\n", path.join("."), render_observed(*value)))
            .collect()
    }

    /// Render a batch of results
    pub fn format_results(&self, results: &ValidationResults) -> String {
        match self.format {
            OutputFormatConfig::Json => to_json(results),
            OutputFormatConfig::Summary => format!(
                "total: {} valid: {} invalid: {} skipped: {}",
                results.total, results.valid, results.invalid, results.skipped
            ),
            OutputFormatConfig::Human => self.format_results_human(results),
        }
    }

    fn format_results_human(&self, results: &ValidationResults) -> String {
        let mut output = String::new();

        match self.verbosity {
            VerbosityLevel::Quiet => {
                if results.has_invalid() {
                    output.push_str(&format!("Invalid: {}\n", results.invalid));
                }
            }
            VerbosityLevel::Normal | VerbosityLevel::Verbose | VerbosityLevel::Debug => {
                output.push_str(&self.format_summary(results));

                if self.verbosity >= VerbosityLevel::Verbose {
                    for item in results.failures() {
                        output.push('\n');
                        output.push_str(&self.format_item_result(item));
                    }
                }

                if self.verbosity == VerbosityLevel::Debug {
                    output.push_str(&self.format_debug_info(results));
                }
            }
        }

        output
    }

    pub fn format_item_result(&self, item: &ItemValidationResult) -> String {
        let duration_str = format_duration(item.duration);

        match &item.status {
            ValidationStatus::Valid => format!(
                "{}  #{} ({})",
                self.colorize("✓ VALID", "32"),
                item.index,
                duration_str
            ),
            ValidationStatus::Invalid {
                invalid_count,
                extra_count,
            } => {
                let mut output = format!(
                    "{}  #{} ({}) - {} invalid, {} extra",
                    self.colorize("✗ INVALID", "31"),
                    item.index,
                    duration_str,
                    invalid_count,
                    extra_count
                );
                if let Some(explanation) = &item.explanation {
                    for (path, value) in explanation.invalid_paths() {
                        output.push_str(&format!(
                            "\n    {}: {}",
                            path.join("."),
                            render_observed(value)
                        ));
                    }
                    for (path, value) in explanation.extra_paths() {
                        output.push_str(&format!(
                            "\n    +{}: {}",
                            path.join("."),
                            render_observed(value)
                        ));
                    }
                }
                output
            }
            ValidationStatus::Skipped => format!(
                "{}  #{} - validation disabled",
                self.colorize("- SKIPPED", "36"),
                item.index
            ),
        }
    }

    fn format_summary(&self, results: &ValidationResults) -> String {
        let mut output = String::new();
        output.push_str(&format!("Validation Summary ({}):\n", results.mode));
        output.push_str(&format!("  Total values: {}\n", results.total));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Valid:", "32"),
            results.valid
        ));

        if results.invalid > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Invalid:", "31"),
                results.invalid
            ));
        }
        if results.skipped > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Skipped:", "36"),
                results.skipped
            ));
        }

        output.push_str(&format!("  Success rate: {:.1}%\n", results.success_rate()));
        output.push_str(&format!("  Duration: {}\n", format_duration(results.duration)));

        output
    }

    fn format_debug_info(&self, results: &ValidationResults) -> String {
        let mut output = String::new();
        output.push_str("\nDebug Information:\n");
        let slowest = results.items.iter().max_by_key(|item| item.duration);
        if let Some(item) = slowest {
            output.push_str(&format!(
                "  Slowest value: #{} ({})\n",
                item.index,
                format_duration(item.duration)
            ));
        }
        output
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|err| format!("{{\"error\": \"serialization failed: {}\"}}", err))
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
