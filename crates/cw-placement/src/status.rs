//! Short user-facing status messages

use std::fmt;

use cw_core::SceneError;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub severity: Severity,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Info => write!(f, "{}", self.text),
            Severity::Warning => write!(f, "Warning: {}", self.text),
            Severity::Error => write!(f, "Error: {}", self.text),
        }
    }
}

/// Log a scene error raised mid-gesture. Missing inputs and objects only
/// skip the step; anything else also surfaces as an error message.
pub(crate) fn report_error(status: &mut Option<StatusMessage>, error: SceneError) {
    if error.is_not_available() {
        debug!("Skipping unavailable step: {}", error);
    } else {
        warn!("Placement update failed: {}", error);
        *status = Some(StatusMessage::error(error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(StatusMessage::info("Placed 2").to_string(), "Placed 2");
        assert_eq!(StatusMessage::warning("No wall").to_string(), "Warning: No wall");
        assert_eq!(StatusMessage::error("Boom").to_string(), "Error: Boom");
    }

    #[test]
    fn test_unavailable_errors_stay_quiet() {
        let mut status = None;
        report_error(&mut status, SceneError::ObjectNotFound(Uuid::new_v4()));
        assert_eq!(status, None);

        let id = Uuid::new_v4();
        report_error(&mut status, SceneError::InvalidParent { child: id, parent: id });
        assert_eq!(status.map(|s| s.severity), Some(Severity::Error));
    }
}
