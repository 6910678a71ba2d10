use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    InvalidUrl,
    Network,
    Timeout,
    /// HTTP 401; the stored token has been cleared.
    Unauthorized,
    /// 4xx carrying a `detail`/`error` payload meant for the user.
    Validation,
    HttpStatus(u16),
    Decode,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::InvalidUrl => write!(f, "invalid url"),
            ApiErrorKind::Network => write!(f, "network error"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::Validation => write!(f, "rejected by server"),
            ApiErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ApiErrorKind::Decode => write!(f, "unexpected response body"),
        }
    }
}

/// Normalised failure of any call through the client facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    pub detail: Option<String>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            detail: None,
            message: message.into(),
        }
    }

    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let kind = match status {
            401 => ApiErrorKind::Unauthorized,
            400..=499 if detail.is_some() => ApiErrorKind::Validation,
            _ => ApiErrorKind::HttpStatus(status),
        };
        let message = match (&kind, &detail) {
            (ApiErrorKind::Validation, Some(detail)) => detail.clone(),
            (_, Some(detail)) => format!("{kind}: {detail}"),
            (_, None) => kind.to_string(),
        };
        Self {
            kind,
            status: Some(status),
            detail,
            message,
        }
    }

    /// Fetch failures and timeouts; retried only by the next poll or search.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, ApiErrorKind::Network | ApiErrorKind::Timeout)
    }

    /// Short text suitable for a notification.
    pub fn user_message(&self) -> String {
        match &self.kind {
            ApiErrorKind::Validation => self.message.clone(),
            ApiErrorKind::Unauthorized => "Your session has expired. Please log in again.".into(),
            kind if self.is_transient() => format!("Could not reach the server ({kind})."),
            _ => format!("Request failed: {}", self.message),
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiErrorKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(ApiErrorKind::InvalidUrl, err.to_string());
    }
    ApiError::new(ApiErrorKind::Network, err.to_string())
}
