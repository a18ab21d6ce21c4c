use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Rejected: {0}")]
    ValidationFailed(String),

    #[error("Unauthorized - credentials or refresh token rejected")]
    Unauthorized,

    #[error("Endpoint not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid carrying excessive data in errors.
    /// The cut is backed off to a char boundary so multibyte bodies never
    /// panic the slice.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(truncated),
            400..=499 => ApiError::ValidationFailed(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_codes_map_to_taxonomy() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "duplicate username"),
            ApiError::ValidationFailed(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            ApiError::ServerError(_)
        ));
    }

    #[test]
    fn multibyte_char_straddling_the_cut_does_not_panic() {
        // 499 ASCII bytes, then a two-byte char spanning the byte-500 cut
        let mut body = "x".repeat(499);
        body.push('é');
        body.push_str(&"y".repeat(100));

        match ApiError::from_status(StatusCode::BAD_REQUEST, &body) {
            ApiError::ValidationFailed(msg) => {
                assert!(msg.contains("truncated"));
                assert!(!msg.contains('é'));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        match ApiError::from_status(StatusCode::BAD_REQUEST, &body) {
            ApiError::ValidationFailed(msg) => {
                assert!(msg.len() < 600);
                assert!(msg.contains("truncated"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
