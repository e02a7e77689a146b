use thiserror::Error;

/// Error types for ticker construction, configuration, and control input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmitError {
    /// Configuration or initialization error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The control-loop thread could not be started.
    #[error("failed to spawn ticker thread: {0}")]
    Spawn(String),

    /// A control command could not be understood.
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

/// Convenience type alias for emit operations.
pub type EmitResult<T> = Result<T, EmitError>;
