//! Selection and draft state behind the console's editor screens.
//!
//! A session never swallows a backend failure: it logs it, keeps a short
//! operator message in `last_error`, and returns the error to the caller.

mod agent_editor;
mod guideline_editor;
mod services_editor;

pub use agent_editor::AgentEditor;
pub use guideline_editor::GuidelineEditor;
pub use services_editor::{ServiceDraft, ServicesEditor};

use parlant_console_core::errors::{ApiError, ApiResult};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),
    #[error("no {0} is selected")]
    NoSelection(&'static str),
    #[error("{context}: {source}")]
    Api { context: &'static str, source: ApiError },
}

impl SessionError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::NoSelection(_) => "validation",
            Self::Api { source, .. } => source.error_class(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::NoSelection(_) => 3,
            Self::Api { source, .. } => source.exit_code(),
        }
    }
}

/// Logs a failed backend call and records the operator message in
/// `last_error`; success clears it.
pub(crate) fn track<T>(
    last_error: &mut Option<String>,
    context: &'static str,
    result: ApiResult<T>,
) -> Result<T, SessionError> {
    match result {
        Ok(value) => {
            *last_error = None;
            Ok(value)
        }
        Err(source) => {
            warn!(
                event_name = "console.session.request_failed",
                context,
                error_class = source.error_class(),
                error = %source,
                "editor request failed"
            );
            *last_error = Some(format!("Failed to {context}. {}", source.user_message()));
            Err(SessionError::Api { context, source })
        }
    }
}

pub(crate) fn reject<T>(
    last_error: &mut Option<String>,
    error: SessionError,
) -> Result<T, SessionError> {
    *last_error = Some(error.to_string());
    Err(error)
}
