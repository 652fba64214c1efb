/// Failures from the media layer. Every metadata problem collapses into
/// `Metadata` and every download/convert problem into `Transcode`; the
/// orchestrator only distinguishes the two kinds, never the root causes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{message}")]
    Metadata { message: String },

    #[error("{message}")]
    Transcode { message: String },
}

impl Error {
    #[must_use]
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn transcode(message: impl Into<String>) -> Self {
        Self::Transcode {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
