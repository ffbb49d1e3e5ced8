//! HTTP error responses for web adapter.

use askama::Template;
use axum::{
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::domain::error::TrendQuestError;

use super::is_htmx_request;
use super::templates::{ErrorPageTemplate, ErrorTemplate};

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Error fragment for HTMX requests, full page otherwise.
    pub fn respond(self, headers: &HeaderMap) -> Response {
        if is_htmx_request(headers) {
            let template = ErrorTemplate {
                message: &self.message,
                status: self.status.as_u16(),
            };
            match template.render() {
                Ok(html) => (self.status, Html(html)).into_response(),
                Err(_) => (self.status, self.message).into_response(),
            }
        } else {
            self.into_response()
        }
    }
}

pub fn status_from_error(err: &TrendQuestError) -> StatusCode {
    match err {
        TrendQuestError::PoolNotFound { .. } | TrendQuestError::StrategyNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        TrendQuestError::RejectedInput { .. } | TrendQuestError::InvalidRequest { .. } => {
            StatusCode::BAD_REQUEST
        }
        TrendQuestError::MalformedOutput { .. } | TrendQuestError::Engine { .. } => {
            StatusCode::BAD_GATEWAY
        }
        TrendQuestError::ConfigParse { .. }
        | TrendQuestError::ConfigMissing { .. }
        | TrendQuestError::ConfigInvalid { .. }
        | TrendQuestError::ParameterSchema { .. }
        | TrendQuestError::Template(_)
        | TrendQuestError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TrendQuestError> for WebError {
    fn from(err: TrendQuestError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl From<askama::Error> for WebError {
    fn from(err: askama::Error) -> Self {
        tracing::error!(error = %err, "template rendering failed");
        Self::internal(err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let template = ErrorPageTemplate {
            title: "TrendQuest",
            message: &self.message,
            status: self.status.as_u16(),
        };
        match template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_errors_are_not_found() {
        let err = TrendQuestError::PoolNotFound { pool: "x".into() };
        assert_eq!(WebError::from(err).status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_request_is_bad_request() {
        let err = TrendQuestError::InvalidRequest {
            reason: "end date 2025-01-01 must be after start date 2025-03-01".into(),
        };
        let web = WebError::from(err);
        assert_eq!(web.status, StatusCode::BAD_REQUEST);
        assert!(web.message.contains("end date"));
    }

    #[test]
    fn malformed_engine_output_is_bad_gateway() {
        let err = TrendQuestError::MalformedOutput {
            record: "trade".into(),
            row: 1,
            reason: "missing field 'pnl'".into(),
        };
        assert_eq!(status_from_error(&err), StatusCode::BAD_GATEWAY);
    }
}
