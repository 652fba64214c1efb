/// The five terminal failure kinds. Request-scoped, never retried
/// automatically; the user resubmits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unauthorized,
    InvalidInput,
    Metadata,
    Transcode,
    Upload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// The single terminal state of one accepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Success {
        /// Human-readable description of where the artifact landed,
        /// e.g. `Music/youtube/2026-08-07`.
        location: String,
    },
    Failure(RequestFailure),
}

impl RequestOutcome {
    #[must_use]
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(RequestFailure {
            kind,
            message: message.into(),
        })
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
