//! Operation failure type shared by every remote call and its presentation hints.

use shared::error::{ApiException, ErrorCode};
use thiserror::Error;

/// Failure of a remote operation. Views render `message()` verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct OperationError {
    message: String,
    code: Option<ErrorCode>,
}

impl OperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Backend error code, when the failure came with an HTTP status.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn category(&self) -> ErrorCategory {
        self.code
            .and_then(ErrorCategory::from_code)
            .unwrap_or_else(|| ErrorCategory::classify(&self.message))
    }
}

impl From<anyhow::Error> for OperationError {
    fn from(value: anyhow::Error) -> Self {
        if let Some(api) = value.downcast_ref::<ApiException>() {
            return Self::with_code(api.code, api.message.clone());
        }
        Self::new(format!("{value:#}"))
    }
}

impl From<ApiException> for OperationError {
    fn from(value: ApiException) -> Self {
        Self::with_code(value.code, value.message)
    }
}

impl From<String> for OperationError {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for OperationError {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Auth,
    Transport,
    Validation,
    Unknown,
}

impl ErrorCategory {
    /// Category implied by a backend status; `None` leaves it to the message.
    pub fn from_code(code: ErrorCode) -> Option<Self> {
        match code {
            ErrorCode::Unauthorized | ErrorCode::Forbidden => Some(ErrorCategory::Auth),
            ErrorCode::Unavailable => Some(ErrorCategory::Transport),
            ErrorCode::Validation => Some(ErrorCategory::Validation),
            ErrorCode::NotFound
            | ErrorCode::Conflict
            | ErrorCode::RateLimited
            | ErrorCode::Internal => None,
        }
    }

    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("forbidden")
            || lower.contains("jwt")
            || lower.contains("session expired")
            || lower.contains("invalid token")
        {
            ErrorCategory::Auth
        } else if lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("connection")
            || lower.contains("connect")
            || lower.contains("network")
            || lower.contains("dns")
            || lower.contains("unavailable")
        {
            ErrorCategory::Transport
        } else if lower.contains("required")
            || lower.contains("invalid")
            || lower.contains("missing")
            || lower.contains("violates")
            || lower.contains("null value")
            || lower.contains("only ")
        {
            ErrorCategory::Validation
        } else {
            ErrorCategory::Unknown
        }
    }

    pub fn hint(self) -> Option<&'static str> {
        match self {
            ErrorCategory::Auth => Some("sign in again or refresh the access token"),
            ErrorCategory::Transport => Some("backend unreachable; check the URL/network and retry"),
            ErrorCategory::Validation => Some("check the submitted fields"),
            ErrorCategory::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anyhow_chain_is_flattened_into_message() {
        let err = anyhow::anyhow!("connection refused").context("failed to fetch jobs");
        let op = OperationError::from(err);
        assert_eq!(op.message(), "failed to fetch jobs: connection refused");
        assert_eq!(op.category(), ErrorCategory::Transport);
    }

    #[test]
    fn api_exception_keeps_backend_message_through_context() {
        let err = anyhow::Error::new(ApiException::new(ErrorCode::Validation, "Name required"))
            .context("failed to create company");
        let op = OperationError::from(err);
        assert_eq!(op.message(), "Name required");
        assert_eq!(op.code(), Some(ErrorCode::Validation));
    }

    #[test]
    fn backend_status_decides_category_over_message() {
        let forbidden = ApiException::from_response(
            403,
            r#"{"message":"permission denied for table jobs"}"#,
        );
        let op = OperationError::from(anyhow::Error::new(forbidden).context("failed to delete job"));
        assert_eq!(op.code(), Some(ErrorCode::Forbidden));
        assert_eq!(op.category(), ErrorCategory::Auth);

        let gateway = OperationError::from(ApiException::from_response(503, "upstream down"));
        assert_eq!(gateway.category(), ErrorCategory::Transport);

        let internal = OperationError::from(ApiException::from_response(500, "statement timeout"));
        assert_eq!(internal.code(), Some(ErrorCode::Internal));
        assert_eq!(internal.category(), ErrorCategory::Transport);
    }

    #[test]
    fn classifies_common_failures() {
        assert_eq!(ErrorCategory::classify("JWT expired"), ErrorCategory::Auth);
        assert_eq!(
            ErrorCategory::classify("Skills are required"),
            ErrorCategory::Validation
        );
        assert_eq!(ErrorCategory::classify("boom"), ErrorCategory::Unknown);
        assert!(ErrorCategory::Unknown.hint().is_none());
    }
}
