use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Panel size does not resolve to an active panel
    #[error("Invalid panel size: {0}")]
    InvalidPanelSize(String),
    /// Supplier id does not resolve
    #[error("Invalid supplier: {0}")]
    InvalidSupplier(String),
    /// Malformed request (bad quantity, unknown material, unparsable body)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Estimate id does not exist
    #[error("Estimate not found: {0}")]
    EstimateNotFound(String),
    /// Stored reference data has an unexpected shape
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
    /// Database unavailable or query failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Internal server error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Whether the caller caused this error (4xx) rather than the service (5xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPanelSize(_) | Self::InvalidSupplier(_) | Self::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::EstimateNotFound(_) => StatusCode::NOT_FOUND,
            Self::DataIntegrity(_) | Self::Database(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidPanelSize(_) => "invalid_panel_size",
            Self::InvalidSupplier(_) => "invalid_supplier",
            Self::InvalidRequest(_) => "invalid_request",
            Self::EstimateNotFound(_) => "not_found",
            Self::DataIntegrity(_) | Self::Database(_) | Self::InternalError(_) => {
                "internal_error"
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side failures keep their detail in the log only
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed with internal error");
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "type": self.error_type(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataIntegrity(format!("JSON error: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AppError::InvalidPanelSize("600x600".to_string());
        assert_eq!(error.to_string(), "Invalid panel size: 600x600");
    }

    #[test]
    fn test_error_type_name() {
        assert_eq!(AppError::InvalidSupplier("x".to_string()).error_type(), "invalid_supplier");
        assert_eq!(AppError::DataIntegrity("x".to_string()).error_type(), "internal_error");
        assert!(AppError::InvalidRequest("x".to_string()).is_client_error());
        assert!(!AppError::InternalError("x".to_string()).is_client_error());
    }

    #[tokio::test]
    async fn test_error_response_status() {
        let response = AppError::InvalidPanelSize("600x600".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::EstimateNotFound("abc".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response =
            AppError::InternalError("disk I/O error at /var/db".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["message"], "internal error");
        assert_eq!(body["error"]["type"], "internal_error");
    }
}
