//! JSON error envelope for API responses.
//!
//! Every failure leaves the API as `{"error": <code>, "message": <text>}`,
//! optionally with a `data` object. Server-side failures are logged with
//! their detail and answered with a fixed message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pagedesk_core::auth::PasswordError;
use pagedesk_db::repositories::{PageError, ThreadingError, UserError};
use pagedesk_gateway::GatewayError;
use pagedesk_shared::{AppError, JwtError};
use sea_orm::DbErr;
use serde_json::{Value, json};
use tracing::{error, warn};

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
    data: Option<Value>,
    detail: Option<String>,
}

impl ApiError {
    /// Creates an error with an explicit status and code.
    #[must_use]
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
            data: None,
            detail: None,
        }
    }

    /// 401 with the given code.
    #[must_use]
    pub fn unauthorized(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    /// 400 `validation_error`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into()).into()
    }

    /// 404 `not_found`.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into()).into()
    }

    /// Attaches a `data` object to the body.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attaches a detail that is logged but never returned.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let detail = err.is_server_error().then(|| err.to_string());
        Self {
            status,
            code: err.error_code().to_ascii_lowercase(),
            message: err.public_message(),
            data: None,
            detail,
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        AppError::Database(err.to_string()).into()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        AppError::from(err).into()
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string()).into()
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        AppError::Internal(err.to_string()).into()
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::DuplicateEmail(_) => Self::new(
                StatusCode::CONFLICT,
                "email_exists",
                "An account with this email already exists",
            ),
            UserError::Database(e) => e.into(),
        }
    }
}

impl From<PageError> for ApiError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::MissingField(_) => Self::validation("Missing fields"),
            PageError::Database(e) => e.into(),
        }
    }
}

impl From<ThreadingError> for ApiError {
    fn from(err: ThreadingError) -> Self {
        match err {
            ThreadingError::ConversationNotFound(_) => Self::not_found("Conversation not found"),
            ThreadingError::MessageNotFound(_) => Self::not_found("Message not found"),
            ThreadingError::Database(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                status = self.status.as_u16(),
                code = %self.code,
                detail = self.detail.as_deref().unwrap_or(""),
                "request failed"
            );
        } else if let Some(detail) = &self.detail {
            warn!(
                status = self.status.as_u16(),
                code = %self.code,
                detail = %detail,
                "request rejected"
            );
        }

        let mut body = json!({
            "error": self.code,
            "message": self.message,
        });
        if let Some(data) = self.data {
            body["data"] = data;
        }
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn body_json(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[rstest]
    #[case(AppError::Validation("bad".into()), StatusCode::BAD_REQUEST, "validation_error")]
    #[case(AppError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED, "unauthorized")]
    #[case(AppError::NotFound("gone".into()), StatusCode::NOT_FOUND, "not_found")]
    #[case(AppError::Conflict("dup".into()), StatusCode::CONFLICT, "conflict")]
    fn test_client_errors_keep_message(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let expected = err.public_message();
        let api: ApiError = err.into();
        assert_eq!(api.status(), status);
        assert_eq!(api.code(), code);
        assert_eq!(api.message, expected);
    }

    #[tokio::test]
    async fn test_server_errors_hide_detail() {
        let api: ApiError = DbErr::Custom("relation \"users\" does not exist".into()).into();
        let (status, body) = body_json(api).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "database_error");
        assert!(!body["message"].as_str().unwrap().contains("relation"));
    }

    #[tokio::test]
    async fn test_gateway_body_is_not_leaked() {
        let api: ApiError = GatewayError::Upstream {
            status: 400,
            body: r#"{"error":{"message":"Invalid OAuth access token"}}"#.into(),
        }
        .into();
        let (status, body) = body_json(api).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("OAuth"));
    }

    #[tokio::test]
    async fn test_data_is_attached() {
        let api = ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "message_not_sent",
            "Message not sent",
        )
        .with_data(json!({"message": {"id": "1"}}));
        let (_, body) = body_json(api).await;

        assert_eq!(body["error"], "message_not_sent");
        assert_eq!(body["data"]["message"]["id"], "1");
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let api: ApiError = UserError::DuplicateEmail("a@b.c".into()).into();
        assert_eq!(api.status(), StatusCode::CONFLICT);
        assert_eq!(api.code(), "email_exists");
    }
}
