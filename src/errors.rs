use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error payload returned to API callers.
///
/// All failed requests share this envelope: `success` is always `false`,
/// `message` is human-readable, and `errors` enumerates per-field validation
/// failures when there are any.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = false)]
    pub success: bool,
    /// Human-readable error description
    #[schema(example = "Product with ID 550e8400-e29b-41d4-a716-446655440000 not found")]
    pub message: String,
    /// Per-field validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[source] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<String>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Unavailable(_) => "Service temporarily unavailable".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Classifies a storage-layer failure into the service taxonomy.
///
/// A unique-constraint violation is the storage layer winning a SKU race
/// that slipped past the existence pre-check, so it surfaces as `Conflict`.
/// Connection-level failures are retryable and surface as `Unavailable`.
impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
            return ServiceError::Conflict("A product with this SKU already exists".to_string());
        }
        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
                ServiceError::Unavailable(err.to_string())
            }
            DbErr::RecordNotFound(msg) => ServiceError::NotFound(msg),
            DbErr::RecordNotUpdated => {
                ServiceError::NotFound("Record no longer exists".to_string())
            }
            other => ServiceError::Database(other),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let fields: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: invalid value", field),
                })
            })
            .collect();
        ServiceError::Validation {
            message: "Validation failed".to_string(),
            fields,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.response_message();

        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "request failed");
        }

        let errors = match self {
            Self::Validation { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        };

        let body = ErrorResponse {
            success: false,
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::Unavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServiceError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let err = ServiceError::Internal("connection string was postgres://user:pw@db".into());
        assert_eq!(err.response_message(), "Internal server error");
    }

    #[test]
    fn connection_failures_classify_as_unavailable() {
        let err: ServiceError =
            DbErr::Conn(sea_orm::RuntimeErr::Internal("connection refused".into())).into();
        assert!(matches!(err, ServiceError::Unavailable(_)));
    }

    #[test]
    fn validation_errors_enumerate_fields() {
        use validator::Validate;

        #[derive(Validate)]
        struct Probe {
            #[validate(length(min = 1, message = "cannot be blank"))]
            name: String,
        }

        let probe = Probe {
            name: String::new(),
        };
        let err: ServiceError = probe.validate().unwrap_err().into();
        match err {
            ServiceError::Validation { fields, .. } => {
                assert_eq!(fields.len(), 1);
                assert!(fields[0].contains("name"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
