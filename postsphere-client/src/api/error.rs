use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// HTTP status behind this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::Api { status, .. } => Some(*status),
            ApiError::NotFound(_) => Some(404),
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::BadRequest(_) => Some(400),
            ApiError::Serialization(_) => None,
        }
    }

    /// Body text the server sent with a non-2xx answer
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Api { message, .. }
            | ApiError::NotFound(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::BadRequest(message) => Some(message),
            ApiError::Network(_) | ApiError::Serialization(_) => None,
        }
    }

    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Api { status, message },
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(ApiError::from_status(403, "no".into()), ApiError::Forbidden(_)));
        assert!(matches!(ApiError::from_status(404, "gone".into()), ApiError::NotFound(_)));
        assert!(matches!(
            ApiError::from_status(502, "bad gateway".into()),
            ApiError::Api { status: 502, .. }
        ));
        assert_eq!(ApiError::from_status(401, String::new()).status(), Some(401));
        assert_eq!(
            ApiError::from_status(409, "Username taken".into()).server_message(),
            Some("Username taken")
        );
    }
}
