use thiserror::Error;

use crate::api::ApiError;

/// Failures surfaced to the user by a controller.
///
/// Every variant's `Display` is the message the view shows; none of them are
/// fatal and none are retried automatically.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The request could not be sent or the server answered non-2xx
    #[error("{0}")]
    NetworkFailure(String),

    /// The action needs a logged-in user
    #[error("{0}")]
    AuthRequired(String),

    /// 403, or a local ownership check failed
    #[error("{0}")]
    Forbidden(String),

    /// A client-side field check failed
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// An action was attempted and did not go through; any optimistic change
    /// has been rolled back
    #[error("{0}")]
    ActionFailed(String),

    /// The view was closed before the result arrived; nothing was applied
    #[error("View closed before the request completed")]
    ViewClosed,
}

impl ClientError {
    pub fn auth_required() -> Self {
        ClientError::AuthRequired("Please log in to continue".to_string())
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ClientError::Forbidden(_))
    }
}

impl From<ApiError> for ClientError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Forbidden(msg) => ClientError::Forbidden(msg),
            ApiError::NotFound(msg) => ClientError::NotFound(msg),
            ApiError::Unauthorized(_) => {
                ClientError::AuthRequired("Session expired or invalid. Please log in again".to_string())
            }
            other => ClientError::NetworkFailure(categorize_error(&other)),
        }
    }
}

/// Turns a transport error into a message a person can act on
pub fn categorize_error(error: &ApiError) -> String {
    match error {
        ApiError::Network(e) if e.is_connect() || e.is_timeout() => {
            "Network Error: Connection failed. Check your network and try again".to_string()
        }
        ApiError::Network(e) => format!("Network Error: {}", e),
        ApiError::Serialization(_) => "Unexpected response from the server".to_string(),
        ApiError::BadRequest(msg) => format!("Validation Error: {}", msg),
        ApiError::Api { status, .. } if *status >= 500 => {
            "Server Error: The server is experiencing issues. Please try again later".to_string()
        }
        ApiError::Api { status, message } => format!("Error {}: {}", status, message),
        other => other.to_string(),
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_map_to_taxonomy() {
        let forbidden: ClientError = ApiError::Forbidden("not yours".into()).into();
        assert!(forbidden.is_forbidden());

        let missing: ClientError = ApiError::NotFound("post 9".into()).into();
        assert_eq!(missing, ClientError::NotFound("post 9".into()));

        let expired: ClientError = ApiError::Unauthorized("expired".into()).into();
        assert!(matches!(expired, ClientError::AuthRequired(_)));

        let server: ClientError = ApiError::Api {
            status: 503,
            message: "down".into(),
        }
        .into();
        assert!(matches!(server, ClientError::NetworkFailure(ref m) if m.starts_with("Server Error")));
    }

    #[test]
    fn test_bad_request_keeps_server_message() {
        let err: ClientError = ApiError::BadRequest("Username already taken".into()).into();
        assert_eq!(err.to_string(), "Validation Error: Username already taken");
    }
}
