//! Error taxonomy for ledgerlink operations.
//!
//! Exactly one variant is produced per failed call. The thiserror Display
//! is the developer-oriented rendering; [`ApiError::user_message`] is the
//! terser user-facing rendering production builds show.

use thiserror::Error;

/// Errors surfaced by the API client and sync layers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request did not complete within its timeout.
    #[error("request timed out")]
    Timeout,

    /// Host name resolution failed.
    #[error("DNS lookup failed: {0}")]
    DnsFailure(String),

    /// The server actively refused the connection.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// Catch-all connectivity failure (no response received).
    #[error("network unreachable: {0}")]
    Network(String),

    /// The server answered with a 4xx/5xx status and a response body.
    #[error("server returned {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Best-effort message extracted from the response body.
        message: String,
    },

    /// The call needs authentication and none (or an invalid one) was sent.
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    /// The server reports the session is no longer valid.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// Token refresh failed; credentials have been cleared.
    #[error("authentication expired, sign in again")]
    AuthenticationExpired,

    /// Caller or library misuse, not a network condition.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Terse user-facing rendering for production builds.
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Timeout => "The request took too long. Please try again.",
            ApiError::DnsFailure(_)
            | ApiError::ConnectionRefused(_)
            | ApiError::Network(_) => "Could not reach the server. Check your connection.",
            ApiError::Server { status, .. } if *status >= 500 => {
                "The server had a problem. Please try again later."
            }
            ApiError::Server { .. } => "The request could not be completed.",
            ApiError::AuthenticationRequired(_) => "Please sign in to continue.",
            ApiError::SessionExpired(_) | ApiError::AuthenticationExpired => {
                "Your session has expired. Please sign in again."
            }
            ApiError::Configuration(_) => "The app is misconfigured. Please reinstall or contact support.",
        }
    }

    /// Whether a retry might succeed: network-level failures, timeouts,
    /// and 5xx responses. 4xx responses and auth/config failures are
    /// terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout
            | ApiError::DnsFailure(_)
            | ApiError::ConnectionRefused(_)
            | ApiError::Network(_) => true,
            ApiError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether this is one of the authentication failure variants.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::AuthenticationRequired(_)
                | ApiError::SessionExpired(_)
                | ApiError::AuthenticationExpired
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ApiError::Server {
            status: 503,
            message: "maintenance".into(),
        };
        assert_eq!(err.to_string(), "server returned 503: maintenance");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }

    #[test]
    fn timeouts_and_network_errors_are_retryable() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::DnsFailure("nx".into()).is_retryable());
        assert!(ApiError::ConnectionRefused("refused".into()).is_retryable());
        assert!(ApiError::Network("down".into()).is_retryable());
    }

    #[test]
    fn five_xx_is_retryable_four_xx_is_not() {
        let err_503 = ApiError::Server {
            status: 503,
            message: String::new(),
        };
        let err_400 = ApiError::Server {
            status: 400,
            message: String::new(),
        };
        assert!(err_503.is_retryable());
        assert!(!err_400.is_retryable());
    }

    #[test]
    fn auth_failures_are_terminal() {
        assert!(!ApiError::AuthenticationExpired.is_retryable());
        assert!(!ApiError::SessionExpired("gone".into()).is_retryable());
        assert!(ApiError::AuthenticationExpired.is_auth_failure());
    }

    #[test]
    fn user_messages_do_not_leak_detail() {
        let err = ApiError::Server {
            status: 500,
            message: "stack trace at line 42".into(),
        };
        assert!(!err.user_message().contains("42"));
    }
}
