use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use {
    cloudtune_media::{
        MediaSource, ProgressEvent, TranscodeJob, VideoDescriptor,
        estimate::{DEFAULT_BITRATE_KBPS, estimate_mp3_size},
        url::{is_youtube_url, video_id},
    },
    cloudtune_store::RemoteStore,
};

use crate::{
    access::is_authorized,
    outcome::{FailureKind, RequestOutcome},
    relay::{ProgressDisplay, ProgressRelay},
    surface::{ChatSurface, MessageRef},
};

pub const UNAUTHORIZED_TEXT: &str = "Sorry, you are not authorized to use this bot.";
pub const INVALID_URL_TEXT: &str = "Please send a valid YouTube URL.";
pub const PROCESSING_TEXT: &str = "Processing your request...";
pub const METADATA_FAILED_TEXT: &str = "Could not get video information.";
pub const UPLOAD_FAILED_TEXT: &str =
    "Error uploading the file to pCloud. Please try again later.";
pub const SUCCESS_TEXT: &str =
    "✅ File uploaded successfully to pCloud. You can find it in your pCloud account.";

/// Coordinates one request from inbound URL to terminal outcome.
///
/// Stages run strictly in sequence: Authorizing → Validating →
/// ResolvingMetadata → Estimating → Transcoding → Uploading → CleaningUp.
/// Every stage after validation reports through a single status message
/// that is edited in place, never through new messages.
pub struct Orchestrator {
    allow_list: Vec<u64>,
    base_folder: String,
    source: Arc<dyn MediaSource>,
    store: Arc<dyn RemoteStore>,
    job: Arc<TranscodeJob>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        allow_list: Vec<u64>,
        base_folder: String,
        source: Arc<dyn MediaSource>,
        store: Arc<dyn RemoteStore>,
        job: TranscodeJob,
    ) -> Self {
        Self {
            allow_list,
            base_folder,
            source,
            store,
            job: Arc::new(job),
        }
    }

    /// Run one request to its terminal outcome. Never panics the caller and
    /// never lets a collaborator error escape unrendered: every failure is
    /// translated into a status-message text and a typed outcome.
    pub async fn handle(
        &self,
        user_id: u64,
        url: &str,
        surface: Arc<dyn ChatSurface>,
    ) -> RequestOutcome {
        info!(user_id, url, "request received");

        // Authorizing
        if !is_authorized(user_id, &self.allow_list) {
            warn!(user_id, "rejecting unauthorized user");
            post_best_effort(&surface, UNAUTHORIZED_TEXT).await;
            return RequestOutcome::failure(FailureKind::Unauthorized, "user not on allow-list");
        }

        // Validating
        if !is_youtube_url(url) {
            post_best_effort(&surface, INVALID_URL_TEXT).await;
            return RequestOutcome::failure(FailureKind::InvalidInput, "not a YouTube URL");
        }
        debug!(video = ?video_id(url), "url accepted");

        let status = StatusMessage::open(surface, PROCESSING_TEXT).await;

        // ResolvingMetadata
        let descriptor = match self.source.resolve(url).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                error!(url, error = %e, "metadata resolution failed");
                status.edit(METADATA_FAILED_TEXT).await;
                return RequestOutcome::failure(FailureKind::Metadata, e.to_string());
            },
        };

        // Estimating: cannot fail.
        let estimated = estimate_mp3_size(&descriptor, DEFAULT_BITRATE_KBPS);
        let size_mb = estimated as f64 / (1024.0 * 1024.0);
        status
            .edit(&format!(
                "Found: {}\nDuration: {} seconds\nEstimated MP3 size: {size_mb:.1}MB\nStarting download...",
                descriptor.title, descriptor.duration_seconds
            ))
            .await;

        // Transcoding
        let artifact = match self.transcode(url, &descriptor, &status).await {
            Ok(artifact) => artifact,
            Err(message) => {
                error!(url, error = %message, "transcode failed");
                status.edit(&format!("Error: {message}")).await;
                return RequestOutcome::failure(FailureKind::Transcode, message);
            },
        };

        status
            .edit(&format!(
                "Download complete: {}\nUploading to pCloud...",
                descriptor.title
            ))
            .await;

        // Uploading, then CleaningUp regardless of the upload result.
        let upload_result = self.upload(&artifact).await;

        if let Err(e) = tokio::fs::remove_file(&artifact.path).await {
            warn!(path = %artifact.path.display(), error = %e, "failed to remove local artifact");
        } else {
            info!(path = %artifact.path.display(), "removed local artifact");
        }

        match upload_result {
            Ok(location) => {
                status.edit(SUCCESS_TEXT).await;
                info!(user_id, location, "request complete");
                RequestOutcome::Success { location }
            },
            Err(message) => {
                error!(user_id, error = %message, "upload failed");
                status.edit(UPLOAD_FAILED_TEXT).await;
                RequestOutcome::failure(FailureKind::Upload, message)
            },
        }
    }

    /// Dispatch the blocking download+convert call to a worker thread with a
    /// progress relay attached. The relay starts before the dispatch and is
    /// closed only after the call returns, so the final event is never lost.
    async fn transcode(
        &self,
        url: &str,
        descriptor: &VideoDescriptor,
        status: &StatusMessage,
    ) -> Result<cloudtune_media::OutputArtifact, String> {
        let display = Arc::new(ConvertingDisplay {
            status: status.clone(),
            title: descriptor.title.clone(),
        });
        let (sink, relay) = ProgressRelay::attach(display);

        let job = Arc::clone(&self.job);
        let source = Arc::clone(&self.source);
        let url = url.to_string();
        let descriptor = descriptor.clone();
        let worker_sink = sink.clone();

        let result = tokio::task::spawn_blocking(move || {
            job.run(source.as_ref(), &url, &descriptor, &|event| {
                worker_sink.push(event);
            })
        })
        .await;

        sink.close();
        relay.join().await;

        match result {
            Ok(Ok(artifact)) => Ok(artifact),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(format!("transcode worker failed: {e}")),
        }
    }

    /// Provision the date-partitioned folder and upload the artifact into it.
    /// Returns the remote location description.
    async fn upload(&self, artifact: &cloudtune_media::OutputArtifact) -> Result<String, String> {
        let bytes = tokio::fs::read(&artifact.path)
            .await
            .map_err(|e| format!("could not read artifact: {e}"))?;

        let date = chrono::Local::now().format("%Y-%m-%d").to_string();
        let mut segments: Vec<&str> = self.base_folder.split('/').collect();
        segments.push(&date);

        let folder = self
            .store
            .ensure_path(&segments)
            .await
            .map_err(|e| e.to_string())?;

        let filename = artifact
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        self.store
            .upload(folder, &filename, bytes)
            .await
            .map_err(|e| e.to_string())?;

        Ok(format!("{}/{date}", self.base_folder.trim_end_matches('/')))
    }
}

/// The single progressively-edited status message of one request.
///
/// Posting or editing can fail without failing the request: the pipeline's
/// job is the relay, the display is best-effort and logged.
#[derive(Clone)]
struct StatusMessage {
    surface: Arc<dyn ChatSurface>,
    message: Option<MessageRef>,
}

impl StatusMessage {
    async fn open(surface: Arc<dyn ChatSurface>, text: &str) -> Self {
        let message = match surface.post(text).await {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(error = %e, "could not post status message");
                None
            },
        };
        Self { surface, message }
    }

    async fn edit(&self, text: &str) {
        let Some(ref message) = self.message else {
            return;
        };
        if let Err(e) = self.surface.edit(message, text).await {
            warn!(error = %e, "could not edit status message");
        }
    }
}

async fn post_best_effort(surface: &Arc<dyn ChatSurface>, text: &str) {
    if let Err(e) = surface.post(text).await {
        warn!(error = %e, "could not post message");
    }
}

/// Renders transcode progress into the status message.
struct ConvertingDisplay {
    status: StatusMessage,
    title: String,
}

#[async_trait]
impl ProgressDisplay for ConvertingDisplay {
    async fn show(&self, event: &ProgressEvent) -> anyhow::Result<()> {
        self.status
            .edit(&format!(
                "Converting: {}\n{}\nProgress: {:.1}%",
                self.title, event.text, event.fraction
            ))
            .await;
        Ok(())
    }
}
