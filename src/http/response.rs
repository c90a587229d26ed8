//! Mapping of security errors to HTTP responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::security::SecurityError;

impl SecurityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SecurityError::Policy(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SecurityError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            SecurityError::AccountLocked { .. } => StatusCode::LOCKED,
            SecurityError::InvalidTokenLength(_) => StatusCode::BAD_REQUEST,
            SecurityError::Decryption(_)
            | SecurityError::Encryption(_)
            | SecurityError::Entropy(_)
            | SecurityError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SecurityError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_fatal() {
            tracing::error!(error = %self, "Entropy source failure");
        } else if status.is_server_error() {
            tracing::warn!(error = %self, "Security operation failed");
        }

        let (body, retry_after) = match &self {
            SecurityError::Policy(violation) => (violation.to_string(), None),
            SecurityError::RateLimitExceeded { retry_after, .. } => {
                ("Rate limit exceeded".to_string(), Some(*retry_after))
            }
            SecurityError::AccountLocked { retry_after } => {
                ("Account temporarily locked".to_string(), Some(*retry_after))
            }
            SecurityError::InvalidTokenLength(_) => (self.to_string(), None),
            SecurityError::Decryption(_)
            | SecurityError::Encryption(_)
            | SecurityError::Entropy(_)
            | SecurityError::InvalidConfig(_) => ("Internal security error".to_string(), None),
        };

        let mut response = (status, body).into_response();
        if let Some(retry_after) = retry_after {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after.as_secs().max(1)),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{DecryptionError, PolicyViolation};
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SecurityError::from(PolicyViolation::MissingDigit).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            SecurityError::AccountLocked {
                retry_after: Duration::from_secs(5)
            }
            .status_code(),
            StatusCode::LOCKED
        );
        assert_eq!(
            SecurityError::from(DecryptionError::KeyNotFound { version: 1 }).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rate_limit_response_has_retry_after() {
        let response = SecurityError::RateLimitExceeded {
            identity: "1.2.3.4".into(),
            path: "/api/v1/nodes".into(),
            retry_after: Duration::from_secs(900),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "900");
    }

    #[test]
    fn test_sub_second_retry_after_rounds_up() {
        let response = SecurityError::AccountLocked {
            retry_after: Duration::from_millis(300),
        }
        .into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }
}
