use thiserror::Error;

#[derive(Error, Debug)]
pub enum UiScoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Target '{target}' not found; tried: {}", .attempted.join(" | "))]
    TargetNotFound {
        target: String,
        attempted: Vec<String>,
    },

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Assertion failed for {what}: expected {expected}, got {actual}")]
    AssertionFailed {
        what: String,
        expected: String,
        actual: String,
    },

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, UiScoutError>;

impl UiScoutError {
    /// Whether this error describes the page under test rather than the
    /// harness (browser transport, config, IO).
    pub fn is_scenario_failure(&self) -> bool {
        matches!(
            self,
            UiScoutError::TargetNotFound { .. }
                | UiScoutError::Timeout { .. }
                | UiScoutError::AssertionFailed { .. }
                | UiScoutError::Navigation { .. }
        )
    }
}
