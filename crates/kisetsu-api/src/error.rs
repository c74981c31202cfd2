use thiserror::Error;

/// Errors from the anime catalog client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request cancelled")]
    RequestCancelled,

    #[error("rate limited by the anime service")]
    RateLimited,

    #[error("resource not found")]
    NotFound,

    #[error("service unavailable (status {status})")]
    ServiceUnavailable { status: u16 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl ApiError {
    /// Map a non-success HTTP status (and the upstream error text, if any)
    /// onto the error taxonomy.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500..=599 => Self::ServiceUnavailable { status },
            _ => Self::Api {
                status,
                message: message.unwrap_or_default(),
            },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::RequestCancelled)
    }

    /// The single human-readable line shown in the error banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::RequestCancelled => "Request cancelled".into(),
            Self::RateLimited => {
                "Too many requests. Please wait a moment and try again.".into()
            }
            Self::NotFound => "Anime not found.".into(),
            Self::ServiceUnavailable { .. } => {
                "The anime service is temporarily unavailable. Please try again later.".into()
            }
            Self::Network(_) => "Network error. Check your connection and try again.".into(),
            Self::InvalidResponse(_) => {
                "Received an unexpected response from the anime service.".into()
            }
            Self::Api { status, message } if message.is_empty() => {
                format!("Request failed (status {status}).")
            }
            Self::Api { message, .. } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(ApiError::from_status(404, None), ApiError::NotFound));
        assert!(matches!(ApiError::from_status(429, None), ApiError::RateLimited));
        assert!(matches!(
            ApiError::from_status(503, None),
            ApiError::ServiceUnavailable { status: 503 }
        ));
        assert!(matches!(
            ApiError::from_status(400, Some("bad query".into())),
            ApiError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_user_message_prefers_upstream_text() {
        let err = ApiError::from_status(400, Some("The q parameter is invalid".into()));
        assert_eq!(err.user_message(), "The q parameter is invalid");

        let err = ApiError::from_status(418, None);
        assert_eq!(err.user_message(), "Request failed (status 418).");
    }

    #[test]
    fn test_rate_limit_message_mentions_waiting() {
        assert!(ApiError::RateLimited.user_message().contains("wait"));
    }
}
