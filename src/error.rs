use ntex::http::StatusCode;
use ntex::web::{HttpResponse, WebResponseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A well-formed request for something this service does not handle.
    #[error("{0}")]
    Rejected(String),

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn missing_field(key: &str) -> Self {
        AppError::BadRequest(format!("missing field {}", key))
    }
}

/// Fails unless a write touched exactly one row.
pub fn expect_one_row(affected: usize, what: &str) -> Result<(), AppError> {
    if affected == 1 {
        Ok(())
    } else {
        Err(AppError::Consistency(format!(
            "{} affected {} rows, expected 1",
            what, affected
        )))
    }
}

impl WebResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Rejected(_) | AppError::Arithmetic(_) => StatusCode::BAD_REQUEST,
            AppError::Db(_)
            | AppError::Consistency(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self, _: &ntex::web::HttpRequest) -> HttpResponse {
        tracing::error!(error = %self, "request failed");
        HttpResponse::build(self.status_code()).json(&serde_json::json!({
            "ok": false,
            "message": self.to_string(),
        }))
    }
}
