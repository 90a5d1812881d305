//! Error types for snapslot-core

use std::fmt::Write;
use thiserror::Error;

/// Remediation command for resolving an error
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RemediationCommand {
    /// Short label describing the command purpose
    pub label: String,
    /// Command to run
    pub command: String,
}

/// Actionable remediation guidance for an error
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Remediation {
    /// One-line summary of how to fix the issue
    pub summary: String,
    /// Suggested commands to resolve or diagnose the issue
    pub commands: Vec<RemediationCommand>,
    /// Additional alternative guidance
    pub alternatives: Vec<String>,
}

impl Remediation {
    /// Create a new remediation with a summary
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            commands: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Add a suggested command
    #[must_use]
    pub fn command(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.commands.push(RemediationCommand {
            label: label.into(),
            command: command.into(),
        });
        self
    }

    /// Add an alternative suggestion
    #[must_use]
    pub fn alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    /// Render remediation text for human-readable output
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "To fix:");
        let _ = writeln!(output, "  {}", self.summary);

        if !self.commands.is_empty() {
            let _ = writeln!(output, "  Commands:");
            for cmd in &self.commands {
                let _ = writeln!(output, "    - {}: {}", cmd.label, cmd.command);
            }
        }

        if !self.alternatives.is_empty() {
            let _ = writeln!(output, "  Alternatives:");
            for alt in &self.alternatives {
                let _ = writeln!(output, "    - {alt}");
            }
        }

        output
    }
}

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for snapslot-core
#[derive(Error, Debug)]
pub enum Error {
    /// Retention policy could not be built
    #[error("Invalid retention policy: {0}")]
    InvalidPolicy(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Storage provider errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl Error {
    /// Return remediation guidance when available.
    #[must_use]
    pub fn remediation(&self) -> Option<Remediation> {
        match self {
            Self::InvalidPolicy(_) => Some(
                Remediation::new(
                    "Set at least one positive retention threshold, tightest first.",
                )
                .command("Validate config", "snapslot check")
                .alternative("Example: thresholds = [\"18h\", \"2days\", \"7days\", \"14days\"]"),
            ),
            Self::Config(err) => Some(err.remediation()),
            Self::Provider(err) => Some(err.remediation()),
        }
    }

    /// Returns true if retrying the failed operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(err) if err.is_retryable())
    }
}

/// Storage provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The request never produced an HTTP response
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Target resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credential rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Non-success response not covered by a more specific variant
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ProviderError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::Transport(_) => Remediation::new(
                "Could not reach the storage provider. Check network connectivity and retry.",
            )
            .command("Check connectivity", "curl -sI https://api.digitalocean.com/v2/")
            .alternative("Verify --api-url if you are using a proxy or mock endpoint."),
            Self::NotFound(what) => Remediation::new(format!(
                "{what} does not exist. Verify the volume name and region."
            ))
            .command("List snapshots", "snapslot list")
            .alternative("Set [backup].volume or pass --volume with the exact volume name."),
            Self::Auth(_) => Remediation::new(
                "The API token was rejected. Generate a token with read/write scope.",
            )
            .command("Check token", "echo ${SNAPSLOT_TOKEN:?unset}")
            .alternative("Set [provider].token or SNAPSLOT_TOKEN."),
            Self::Api { status, .. } => Remediation::new(format!(
                "The provider rejected the request with HTTP {status}. Retry later."
            ))
            .alternative("Check the provider status page for ongoing incidents."),
            Self::Decode(_) => Remediation::new(
                "The provider returned an unexpected response. Verify the API URL.",
            )
            .alternative("Point --api-url at the v2 API root, ending with a slash."),
        }
    }

    /// Transport failures, rate limiting and server errors are worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::NotFound(_) | Self::Auth(_) | Self::Decode(_) => false,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file {0}: {1}")]
    ReadFailed(String, String),

    #[error("Failed to parse config: {0}")]
    ParseFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ConfigError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::FileNotFound(path) => Remediation::new(format!(
                "Config file not found: {path}. Verify the path and retry."
            ))
            .command("Check path", format!("ls -l \"{path}\""))
            .alternative("Pass --config with the correct path."),
            Self::ReadFailed(path, _) => Remediation::new(format!(
                "Failed to read config file: {path}. Check permissions."
            ))
            .command("Check permissions", format!("ls -l \"{path}\""))
            .alternative("Ensure the file is readable by the current user."),
            Self::ParseFailed(_) => Remediation::new("Config parse failed. Fix the syntax and retry.")
                .command("Validate config", "snapslot check")
                .alternative("Durations use humantime syntax, e.g. \"18h\" or \"7days\"."),
            Self::ValidationError(_) => Remediation::new("Config validation failed.")
                .command("Validate config", "snapslot check")
                .alternative("Provide the token and volume via flags or environment."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remediation_available_for_error_variants() {
        let errors = vec![
            Error::InvalidPolicy("empty".to_string()),
            Error::Config(ConfigError::FileNotFound("/tmp/x.toml".to_string())),
            Error::Config(ConfigError::ReadFailed("/tmp/x.toml".to_string(), "denied".to_string())),
            Error::Config(ConfigError::ParseFailed("bad".to_string())),
            Error::Config(ConfigError::ValidationError("token".to_string())),
            Error::Provider(ProviderError::Transport("reset".to_string())),
            Error::Provider(ProviderError::NotFound("volume vol-1".to_string())),
            Error::Provider(ProviderError::Auth("401".to_string())),
            Error::Provider(ProviderError::Api {
                status: 500,
                body: "oops".to_string(),
            }),
            Error::Provider(ProviderError::Decode("missing field".to_string())),
        ];

        for err in errors {
            let remediation = err.remediation();
            assert!(remediation.is_some(), "missing remediation for {err}");
            let rendered = remediation.unwrap().render_plain();
            assert!(rendered.starts_with("To fix:"));
        }
    }

    #[test]
    fn retryable_classification() {
        assert!(ProviderError::Transport("timeout".into()).is_retryable());
        assert!(
            ProviderError::Api {
                status: 429,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            ProviderError::Api {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !ProviderError::Api {
                status: 422,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!ProviderError::Auth("bad token".into()).is_retryable());
        assert!(!ProviderError::NotFound("volume".into()).is_retryable());
        assert!(!Error::InvalidPolicy("empty".into()).is_retryable());
        assert!(Error::Provider(ProviderError::Transport("x".into())).is_retryable());
    }

    #[test]
    fn render_plain_lists_commands_and_alternatives() {
        let text = Remediation::new("Do the thing.")
            .command("Run", "snapslot check")
            .alternative("Or not.")
            .render_plain();
        assert!(text.contains("  Do the thing."));
        assert!(text.contains("    - Run: snapslot check"));
        assert!(text.contains("    - Or not."));
    }
}
