/// Failure kind of a [`LendTrackerError`], for uniform matching by callers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    Timeout,
    Network,
    Server,
    Unknown,
    /// Endpoint-level failure for a non-success status on a status-checked call.
    Rejected,
}

/// Error type returned by this crate.
///
/// Every failure is classified when it happens; raw transport errors never
/// reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum LendTrackerError {
    /// An attempt did not complete within its deadline.
    #[error("Request timed out. Please check your connection.")]
    Timeout {
        /// Key sent with a mutating request, if any.
        idempotency_key: Option<String>,
    },
    /// No transport-level connectivity (DNS, refused or reset connection).
    #[error("Unable to connect to server. Please check your internet connection.")]
    Network {
        detail: String,
        /// Key sent with a mutating request, if any.
        idempotency_key: Option<String>,
    },
    /// Remote returned a 5xx status and no attempts remain.
    #[error("Server error ({status})")]
    Server { status: u16, body: String },
    /// Anything else, including response decoding failures.
    #[error("An unexpected error occurred: {detail}")]
    Unknown {
        detail: String,
        /// Raw body of a response that failed to decode.
        body: Option<String>,
    },
    /// Non-success HTTP status on an endpoint that checks status.
    #[error("{message} (http {status})")]
    Rejected {
        message: &'static str,
        status: u16,
        body: String,
    },
}

impl LendTrackerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Network { .. } => ErrorKind::Network,
            Self::Server { .. } => ErrorKind::Server,
            Self::Unknown { .. } => ErrorKind::Unknown,
            Self::Rejected { .. } => ErrorKind::Rejected,
        }
    }

    /// Whether a retrying call may make another attempt after this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Timeout | ErrorKind::Network | ErrorKind::Server
        )
    }

    /// HTTP status carried by `Server` and `Rejected` failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Idempotency key of the mutating request whose outcome is unknown.
    ///
    /// Set only for `Timeout` and `Network` failures of mutating calls: the
    /// write may still have been applied server-side.
    pub fn idempotency_key(&self) -> Option<&str> {
        match self {
            Self::Timeout { idempotency_key } | Self::Network { idempotency_key, .. } => {
                idempotency_key.as_deref()
            }
            _ => None,
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error, idempotency_key: Option<&str>) -> Self {
        let idempotency_key = idempotency_key.map(str::to_owned);
        if err.is_timeout() {
            Self::Timeout { idempotency_key }
        } else if err.is_connect() || err.is_request() {
            Self::Network {
                detail: err.to_string(),
                idempotency_key,
            }
        } else {
            Self::unknown(err.to_string())
        }
    }

    pub(crate) fn unknown(detail: impl Into<String>) -> Self {
        Self::Unknown {
            detail: detail.into(),
            body: None,
        }
    }

    pub(crate) fn decode(err: serde_json::Error, body: &str) -> Self {
        Self::Unknown {
            detail: format!("invalid response JSON: {err}"),
            body: Some(body.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, LendTrackerError};

    #[test]
    fn retryable_kinds() {
        assert!(LendTrackerError::Timeout {
            idempotency_key: None
        }
        .is_retryable());
        assert!(LendTrackerError::Server {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!LendTrackerError::unknown("boom").is_retryable());
        assert!(!LendTrackerError::Rejected {
            message: "failed to fetch loans",
            status: 404,
            body: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn messages_are_user_presentable() {
        let err = LendTrackerError::Server {
            status: 502,
            body: "bad gateway".to_owned(),
        };
        assert_eq!(err.to_string(), "Server error (502)");
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.status(), Some(502));

        let err = LendTrackerError::Network {
            detail: "connection refused".to_owned(),
            idempotency_key: Some("k-1".to_owned()),
        };
        assert_eq!(
            err.to_string(),
            "Unable to connect to server. Please check your internet connection."
        );
        assert_eq!(err.idempotency_key(), Some("k-1"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn decode_failure_keeps_body_out_of_message() {
        let page = "<html><body>502 Bad Gateway</body></html>";
        let err = serde_json::from_str::<serde_json::Value>(page)
            .map_err(|err| LendTrackerError::decode(err, page))
            .expect_err("html must not decode");

        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(!err.to_string().contains("<html>"));
        match err {
            LendTrackerError::Unknown { body, .. } => assert_eq!(body.as_deref(), Some(page)),
            other => panic!("expected unknown error, got {other:?}"),
        }
    }
}
