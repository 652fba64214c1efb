//! Pluggable media backends.
//!
//! [`MediaSource`] is the seam between the pipeline and whatever tool
//! actually talks to the remote site. The production backend drives the
//! yt-dlp binary; tests substitute in-memory fakes.

pub mod ytdlp;

use std::path::Path;

use async_trait::async_trait;

use crate::{descriptor::VideoDescriptor, error::Result, progress::RawProgress};

/// Callback receiving raw driver progress, fired from the worker thread at
/// whatever frequency the driver reports.
pub type ProgressHook<'a> = &'a (dyn Fn(RawProgress) + Send + Sync);

#[async_trait]
pub trait MediaSource: Send + Sync {
    /// One round trip to the extraction service; no download.
    async fn resolve(&self, url: &str) -> Result<VideoDescriptor>;

    /// Download the best audio stream and convert it to a 128 kbps MP3 at
    /// `<output_stem>.mp3`.
    ///
    /// Blocking; run it on a worker thread, never on the async runtime.
    fn download_audio(
        &self,
        url: &str,
        output_stem: &Path,
        on_progress: ProgressHook<'_>,
    ) -> Result<()>;
}
