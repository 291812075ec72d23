use thiserror::Error;

/// Failure of a single backend call, classified for the operator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("request failed with HTTP {status}{}", detail_suffix(.message))]
    Request { status: u16, message: Option<String> },
    #[error("network failure: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn request(status: u16, message: Option<String>) -> Self {
        Self::Request { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Request { .. } => "request",
            Self::Network(_) => "network",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 3,
            Self::Request { .. } => 4,
            Self::Network(_) => 5,
            Self::InvalidResponse(_) => 6,
        }
    }

    /// Short sentence safe to show in the console. Backend-supplied messages
    /// are preferred because they usually name the offending field.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Request { message: Some(message), .. } => message.clone(),
            Self::Request { status, message: None } if *status == 404 => {
                "The requested item no longer exists on the server.".to_string()
            }
            Self::Request { status, message: None } => {
                format!("The server rejected the request (HTTP {status}).")
            }
            Self::Network(_) => {
                "The server could not be reached. Check the API address and try again.".to_string()
            }
            Self::InvalidResponse(_) => "The server sent a response that could not be read.".to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

fn detail_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|message| format!(": {message}")).unwrap_or_default()
}
