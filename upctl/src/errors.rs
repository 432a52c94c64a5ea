use thiserror::Error as ThisError;

/// Alert shown when a request cannot be completed for reasons outside the service's control.
pub const NETWORK_ERROR_MESSAGE: &str = "A network or unexpected error occurred.";

/// Input problems detected locally, before any request is sent.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// No file was selected
    #[error("Please select a file.")]
    MissingFile,

    /// `app_id` is empty or contains something other than decimal digits
    #[error("App ID must be a number.")]
    InvalidAppId,
}

#[derive(ThisError, Debug)]
pub enum Error {
    /// Form input rejected before sending
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Non-2xx response from the processing service
    #[error("Error: {message}")]
    Application { status: u16, message: String },

    /// Network failure, timeout, or an unreadable response
    #[error(transparent)]
    Transport(#[from] anyhow::Error),

    /// Local filesystem failure while handling the result blob
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Configuration rejected at load time
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns the text shown to the user, without leaking transport or filesystem details
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(err) => err.to_string(),
            Error::Application { .. } | Error::Config(_) => self.to_string(),
            Error::Transport(_) | Error::Io(_) => NETWORK_ERROR_MESSAGE.to_string(),
        }
    }

    /// Log full error details, at a level matching the severity.
    pub fn log(&self) {
        match self {
            Error::Transport(_) | Error::Io(_) => {
                tracing::error!("Unexpected error while contacting the service: {:#}", self);
            }
            Error::Application { status, message } => {
                tracing::warn!(status = *status, "Service rejected the request: {}", message);
            }
            Error::Validation(_) => {
                tracing::debug!("Validation error: {}", self);
            }
            Error::Config(_) => {
                tracing::error!("{}", self);
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(anyhow::Error::new(err))
    }
}

/// Type alias for controller operation results
pub type Result<T> = std::result::Result<T, Error>;
