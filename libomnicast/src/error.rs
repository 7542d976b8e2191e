//! Error types for Omnicast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OmnicastError>;

#[derive(Error, Debug)]
pub enum OmnicastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generation error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl OmnicastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            OmnicastError::InvalidInput(_) => 3,
            OmnicastError::Publish(PublishError::Authorization(_)) => 2,
            OmnicastError::Publish(_) => 1,
            OmnicastError::Config(_) => 1,
            OmnicastError::Generator(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("No publisher available for platform: {0}")]
    MissingPublisher(String),

    #[error("Duplicate publisher for platform: {0}")]
    DuplicatePublisher(String),
}

/// Failures of the content/media generation collaborators.
#[derive(Error, Debug, Clone)]
pub enum GeneratorError {
    #[error("Provider request failed: {0}")]
    Provider(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Failures inside a single platform publication attempt.
///
/// Publishers convert every one of these into a failed `PublishResult`;
/// none escapes to the orchestrator.
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),
}
