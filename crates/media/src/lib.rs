//! Media acquisition: metadata resolution, MP3 size estimation, the yt-dlp
//! download/transcode backend, and temp-workdir management with TTL cleanup.

pub mod descriptor;
pub mod error;
pub mod estimate;
pub mod progress;
pub mod source;
pub mod transcode;
pub mod url;
pub mod workdir;

pub use {
    descriptor::VideoDescriptor,
    error::{Error, Result},
    progress::{ProgressEvent, ProgressStatus, RawProgress},
    source::{MediaSource, ytdlp::YtdlpSource},
    transcode::{OutputArtifact, TranscodeJob},
};
