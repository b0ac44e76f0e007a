//! API error types shared by all handlers.
//!
//! Every error renders as `{ "error": <message> }` with the matching HTTP
//! status. Store failures keep their endpoint-specific public message while
//! the underlying error is logged server-side, never echoed to the caller.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

/// Error kinds a handler can surface.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed required input.
    #[error("{0}")]
    Validation(String),

    /// The resource named by the request does not exist. Carries the entity
    /// label used in the public message, e.g. "Project" -> "Project not found".
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A store-level uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// A store operation failed. `context` is the public message; the SQLx
    /// error is logged when the response is rendered.
    #[error("{context}")]
    Database {
        context: &'static str,
        source: sqlx::Error,
    },
}

impl ApiError {
    /// Adapter for `map_err` that attaches an endpoint-specific public
    /// message to a SQLx error.
    pub fn db(context: &'static str) -> impl FnOnce(sqlx::Error) -> ApiError {
        move |source| ApiError::Database { context, source }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Database { context, source } = self {
            tracing::error!(error = ?source, context = %context, "database operation failed");
        }
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}

/// Parses a path identifier, mapping malformed input to a 404 for the given
/// entity label. A garbled id must never surface as a 500.
pub fn parse_id(raw: &str, entity: &'static str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(entity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_includes_entity() {
        let err = ApiError::NotFound("Project");
        assert_eq!(err.to_string(), "Project not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn malformed_id_maps_to_not_found() {
        let err = parse_id("not-a-uuid", "Blog post").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn simple_uuid_form_is_accepted() {
        let id = uuid::Uuid::new_v4();
        let parsed = parse_id(&id.simple().to_string(), "Contact").unwrap();
        assert_eq!(parsed, id);
    }
}
