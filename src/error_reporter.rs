use crate::config::ConfigError;
use crate::error::ShapeError;
use crate::explain::render_observed;
use crate::output::VerbosityLevel;

/// Error reporter with configurable verbosity
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
    show_timestamps: bool,
}

impl ErrorReporter {
    /// Create a new error reporter with specified verbosity
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_timestamps: false,
        }
    }

    /// Create a new error reporter with additional options
    pub fn with_options(verbosity: VerbosityLevel, show_timestamps: bool) -> Self {
        Self {
            verbosity,
            show_timestamps,
        }
    }

    /// Report an error to stderr with appropriate verbosity
    pub fn report_error(&self, error: &ShapeError) {
        if let Some(formatted) = self.format_error(error) {
            eprintln!("{}", formatted);
        }
    }

    /// Report a configuration error
    pub fn report_config_error(&self, error: &ConfigError) {
        eprintln!("{}", self.format_config_error(error));
    }

    /// Format an error for the configured verbosity; `None` when quiet mode
    /// suppresses it
    pub fn format_error(&self, error: &ShapeError) -> Option<String> {
        match self.verbosity {
            VerbosityLevel::Quiet => self
                .is_critical_error(error)
                .then(|| self.format_error_brief(error)),
            VerbosityLevel::Normal => Some(self.format_error_normal(error)),
            VerbosityLevel::Verbose => Some(self.format_error_verbose(error)),
            VerbosityLevel::Debug => Some(self.format_error_debug(error)),
        }
    }

    pub fn format_config_error(&self, error: &ConfigError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => format!("Config error: {}", error),
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                format!(
                    "Configuration Error: {}\n{}",
                    error,
                    self.get_config_help(error)
                )
            }
            VerbosityLevel::Debug => {
                format!(
                    "Configuration Error: {}\nDebug: {:?}\n{}",
                    error,
                    error,
                    self.get_config_help(error)
                )
            }
        }
    }

    /// Errors that indicate a misuse of the library rather than bad data
    fn is_critical_error(&self, error: &ShapeError) -> bool {
        matches!(
            error,
            ShapeError::ContractViolation { .. }
                | ShapeError::InvalidDefaults { .. }
                | ShapeError::Config(_)
                | ShapeError::Concurrency { .. }
        )
    }

    /// Format error for brief output (quiet mode)
    fn format_error_brief(&self, error: &ShapeError) -> String {
        match error {
            ShapeError::InvalidDefaults { name, .. } => format!("INVALID DEFAULTS: {}", name),
            ShapeError::ContractViolation { operation, .. } => {
                format!("CONTRACT VIOLATION: {}", operation)
            }
            _ => format!("ERROR: {}", error),
        }
    }

    /// Format error for normal output
    fn format_error_normal(&self, error: &ShapeError) -> String {
        let timestamp = if self.show_timestamps {
            format!("[{}] ", chrono::Utc::now().format("%H:%M:%S"))
        } else {
            String::new()
        };

        format!("{}{}", timestamp, error)
    }

    /// Format error for verbose output
    fn format_error_verbose(&self, error: &ShapeError) -> String {
        let mut output = self.format_error_normal(error);

        if let Some(explanation) = error.explanation() {
            for (path, value) in explanation.invalid_paths() {
                output.push_str(&format!(
                    "\n  invalid {}: {}",
                    path.join("."),
                    render_observed(value)
                ));
            }
            for (path, value) in explanation.extra_paths() {
                output.push_str(&format!(
                    "\n  extra   {}: {}",
                    path.join("."),
                    render_observed(value)
                ));
            }
        }

        match error {
            ShapeError::InvalidDefaults { .. } => {
                output.push_str("\nSuggestion: Fix each default so it satisfies its own rule");
            }
            ShapeError::ContractViolation { .. } => {
                output.push_str("\nSuggestion: Check the arguments passed to this operation");
            }
            ShapeError::Pattern(_) => {
                output.push_str("\nSuggestion: Check the regular expression syntax");
            }
            _ => {}
        }

        output
    }

    /// Format error for debug output
    fn format_error_debug(&self, error: &ShapeError) -> String {
        let mut output = self.format_error_verbose(error);
        output.push_str(&format!("\nDebug Info: {:?}", error));

        output.push_str("\nError Chain:");
        let mut current_error: &dyn std::error::Error = error;
        let mut level = 0;
        while let Some(source) = current_error.source() {
            output.push_str(&format!("\n  {}: {}", level + 1, source));
            current_error = source;
            level += 1;
        }

        output
    }

    /// Get helpful suggestions for configuration errors
    fn get_config_help(&self, error: &ConfigError) -> String {
        match error {
            ConfigError::Io(_) => "Check that the configuration file exists and is readable".to_string(),
            ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
                "Check the configuration file syntax (TOML/JSON format expected)".to_string()
            }
            ConfigError::Validation(_) => "Fix the reported configuration value".to_string(),
            ConfigError::Environment(_) => {
                "Check VALIDATE_SHAPE_* environment variables".to_string()
            }
            ConfigError::UnsupportedFormat(ext) => {
                format!("Rename the '.{}' file to '.toml' or '.json'", ext)
            }
        }
    }
}
