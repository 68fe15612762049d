/// Error Handling Module
///
/// One error type per concern, unified into `AppError` for control flow
/// and mapped onto HTTP responses at the actix boundary.
///
/// Authentication and authorization failures collapse to one fixed
/// caller-visible message per category. The internal cause is logged
/// together with a request id and never returned to the caller.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;

const AUTHENTICATION_FAILED: &str = "Invalid credentials or token";
const AUTHORIZATION_FAILED: &str = "Not allowed to access this resource";

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for request input
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooShort(&'static str, usize),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
    SuspiciousContent(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
        }
    }
}

impl StdError for ValidationError {}

/// Failures reported by the persistence collaborators
#[derive(Debug)]
pub enum StoreError {
    /// Missing, revoked and expired rows are all reported this way.
    NotFound,
    UniqueViolation(String),
    Unavailable(String),
    Query(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "Record not found"),
            StoreError::UniqueViolation(msg) => write!(f, "Duplicate entry: {}", msg),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Query(msg) => write!(f, "Query error: {}", msg),
        }
    }
}

impl StdError for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                StoreError::UniqueViolation(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Authentication and authorization errors
#[derive(Debug)]
pub enum AuthError {
    /// No credential in the authorization header, or the wrong scheme.
    MissingCredential,
    /// Access token failed verification or refresh token did not resolve.
    InvalidToken,
    /// Unknown identifier or wrong secret at login.
    InvalidCredentials,
    /// Valid identity without rights over the targeted resource.
    Forbidden,
    /// Stored hash was not produced by the credential hasher.
    MalformedHash,
    Hashing(String),
    Signing(String),
}

impl AuthError {
    /// True for failures that mean "no identity established".
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            AuthError::MissingCredential | AuthError::InvalidToken | AuthError::InvalidCredentials
        )
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingCredential => write!(f, "Missing authentication credential"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::Forbidden => write!(f, "Subject does not own the resource"),
            AuthError::MalformedHash => write!(f, "Stored password hash is malformed"),
            AuthError::Hashing(msg) => write!(f, "Password hashing failed: {}", msg),
            AuthError::Signing(msg) => write!(f, "Token signing failed: {}", msg),
        }
    }
}

impl StdError for AuthError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Store(StoreError),
    Auth(AuthError),
    Config(ConfigError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.into())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", err))
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error body returned to callers
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Request id the failure was logged under
    pub error_id: String,
    pub message: String,
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl AppError {
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),

            AppError::Store(e) => match e {
                StoreError::NotFound => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "Resource not found".to_string(),
                ),
                StoreError::UniqueViolation(_) => (
                    StatusCode::CONFLICT,
                    "DUPLICATE_ENTRY",
                    "Resource already exists".to_string(),
                ),
                StoreError::Unavailable(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Store temporarily unavailable".to_string(),
                ),
                StoreError::Query(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "Internal server error".to_string(),
                ),
            },

            AppError::Auth(e) if e.is_authentication() => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_FAILED",
                AUTHENTICATION_FAILED.to_string(),
            ),
            AppError::Auth(AuthError::Forbidden) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                AUTHORIZATION_FAILED.to_string(),
            ),
            AppError::Auth(_) | AppError::Config(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = self.classify();
        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code.to_string(),
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Store(StoreError::NotFound) => {
                tracing::info!(request_id = request_id, "Record not found");
            }
            AppError::Store(StoreError::UniqueViolation(_)) => {
                tracing::warn!(request_id = request_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Store(e) => {
                tracing::error!(request_id = request_id, error = %e, "Store error");
            }
            AppError::Auth(e) if e.is_authentication() => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication failed");
            }
            AppError::Auth(AuthError::Forbidden) => {
                tracing::warn!(request_id = request_id, error = %self, "Authorization denied");
            }
            AppError::Auth(e) => {
                tracing::error!(request_id = request_id, error = %e, "Credential subsystem failure");
            }
            AppError::Config(e) => {
                tracing::error!(request_id = request_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = current_request_id();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}

// ============================================================================
// 4. ERROR CONTEXT
// ============================================================================

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Run `fut` with `request_id` as the id of the request it serves.
///
/// Handler log lines and the `error_id` of an error response both read
/// this id, so a caller-visible error can be found in the logs.
pub fn scope_request_id<F: Future>(request_id: String, fut: F) -> impl Future<Output = F::Output> {
    REQUEST_ID.scope(request_id, fut)
}

/// Id of the request being served; a fresh one outside any request scope
pub fn current_request_id() -> String {
    REQUEST_ID
        .try_with(|id| id.clone())
        .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string())
}

/// Per-request context used to correlate log lines of one operation
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: current_request_id(),
            user_id: None,
            operation: operation.into(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl ToString) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(err: AppError) -> (StatusCode, ErrorResponse) {
        <AppError as ErrorHandler>::error_response(&err, "test-123")
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email");
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn authentication_failures_share_one_message() {
        let (s1, r1) = render(AuthError::MissingCredential.into());
        let (s2, r2) = render(AuthError::InvalidToken.into());
        let (s3, r3) = render(AuthError::InvalidCredentials.into());

        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s1, s2);
        assert_eq!(s2, s3);
        assert_eq!(r1.message, r2.message);
        assert_eq!(r2.message, r3.message);
        assert_eq!(r1.code, "AUTHENTICATION_FAILED");
    }

    #[test]
    fn forbidden_is_distinct_from_authentication() {
        let (status, response) = render(AuthError::Forbidden.into());
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(response.code, "FORBIDDEN");
        assert_ne!(response.message, AUTHENTICATION_FAILED);
    }

    #[test]
    fn internal_causes_are_not_echoed() {
        let (status, response) = render(AuthError::Signing("bad key bytes".to_string()).into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.message.contains("bad key bytes"));

        let (_, response) = render(StoreError::Query("relation does not exist".to_string()).into());
        assert!(!response.message.contains("relation"));
    }

    #[test]
    fn store_errors_map_to_statuses() {
        assert_eq!(render(StoreError::NotFound.into()).0, StatusCode::NOT_FOUND);
        assert_eq!(
            render(StoreError::UniqueViolation("email".to_string()).into()).0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            render(StoreError::Unavailable("pool".to_string()).into()).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn row_not_found_becomes_store_not_found() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn context_and_error_response_share_the_request_id() {
        let (context_id, error_id) = scope_request_id("req-42".to_string(), async {
            let context = ErrorContext::new("user_login");
            let response = ResponseError::error_response(&AppError::from(AuthError::InvalidToken));
            let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
            (context.request_id, body["error_id"].as_str().unwrap().to_string())
        })
        .await;

        assert_eq!(context_id, "req-42");
        assert_eq!(error_id, "req-42");
    }

    #[test]
    fn outside_a_request_ids_are_fresh() {
        assert_ne!(current_request_id(), current_request_id());
    }

    #[test]
    fn test_error_context_creation() {
        let ctx = ErrorContext::new("test_operation");
        assert_eq!(ctx.operation, "test_operation");
        assert!(ctx.user_id.is_none());

        let ctx_with_user = ctx.with_user_id("user-123");
        assert_eq!(ctx_with_user.user_id, Some("user-123".to_string()));
    }
}
