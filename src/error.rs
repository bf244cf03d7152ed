use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bigdecimal::BigDecimal;
use serde::Serialize;
use thiserror::Error;

/// 明细字段编辑错误
#[derive(Debug, Error, PartialEq)]
pub enum EditorError {
    #[error("item {0} not found")]
    ItemNotFound(String),

    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(BigDecimal),

    #[error("unit price must not be negative, got {0}")]
    NegativePrice(BigDecimal),

    #[error("tax rate must not be negative, got {0}")]
    NegativeTaxRate(BigDecimal),

    #[error("split ratio must be within 0..=100, got {0}")]
    SplitRatioOutOfRange(BigDecimal),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Export error: {0}")]
    Export(String),
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Export(err.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Editor(EditorError::ItemNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Editor(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Config(_) | AppError::Export(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

/// 错误响应体, 与成功响应共用 success/message 结构
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        let body = ErrorResponse {
            success: false,
            message: format!("Error: {}", self),
        };
        (status, Json(body)).into_response()
    }
}
