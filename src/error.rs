use thiserror::Error;

/// Why a metrics source did not produce a usable snapshot.
///
/// The resolution chain treats every variant the same way: it moves on to
/// the next source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Metrics source unavailable: {0}")]
    Unavailable(String),

    #[error("Metrics source returned no libraries")]
    Empty,

    #[error("Malformed metrics payload: {0}")]
    Malformed(String),

    #[error("Metrics source timed out after {0} ms")]
    Timeout(u64),
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid surface message: {0}")]
    Invalid(String),

    #[error("Surface message field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("Surface message field `{0}` must be a finite number")]
    NonFinite(&'static str),

    #[error("Surface message field `{0}` must be greater than zero")]
    NotPositive(&'static str),

    #[error("No active visualization panel")]
    NoActivePanel,
}

#[derive(Error, Debug)]
pub enum FileOpenError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Editor command is empty")]
    EmptyCommand,

    #[error("Failed to launch editor: {0}")]
    Launch(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid scanner file pattern `{pattern}`: {message}")]
    FilePattern { pattern: String, message: String },

    #[error("Failed to create visualization panel: {0}")]
    Panel(String),
}
