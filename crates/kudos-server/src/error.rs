use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kudos_core::KudosError;

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(anyhow::Error::new(BadRequest(msg.into())))
    }
}

/// Private sentinel carrying an explicit HTTP 400 through the anyhow chain.
#[derive(Debug)]
struct BadRequest(String);

impl std::fmt::Display for BadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequest {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(b) = self.0.downcast_ref::<BadRequest>() {
            let body = serde_json::json!({ "error": b.0.clone() });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<KudosError>() {
            match e {
                // Recoverable transport failure; the caller retries with backoff.
                KudosError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                KudosError::EntryNotInitialized(_) | KudosError::MemberNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                KudosError::Tracker(_) | KudosError::TrackerStatus { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                KudosError::NotSignedIn => StatusCode::UNAUTHORIZED,
                KudosError::NoActiveIteration => StatusCode::NOT_FOUND,
                KudosError::Io(_) | KudosError::Yaml(_) | KudosError::Json(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
