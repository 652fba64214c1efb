use std::path::{Path, PathBuf};

use cloudtune_common::util::sanitize_filename;
use tracing::{debug, info};

use crate::{
    descriptor::VideoDescriptor,
    error::{Error, Result},
    progress::ProgressEvent,
    source::MediaSource,
};

/// The locally produced MP3 awaiting upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Drives one blocking download+convert run and checks its post-condition.
///
/// The output filename derives from the sanitized video title, so two
/// concurrent requests resolving to identical sanitized titles would race
/// on the same path. Accepted risk; no locking.
pub struct TranscodeJob {
    workdir: PathBuf,
}

impl TranscodeJob {
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Where the artifact for `title` will land.
    #[must_use]
    pub fn output_path(&self, title: &str) -> PathBuf {
        self.workdir.join(format!("{}.mp3", sanitize_filename(title)))
    }

    /// Run the blocking download+convert call.
    ///
    /// Must be called from a worker thread (`spawn_blocking`); it does not
    /// return until the external tool exits. Progress events are emitted
    /// through `on_progress` from this same thread.
    pub fn run(
        &self,
        source: &dyn MediaSource,
        url: &str,
        descriptor: &VideoDescriptor,
        on_progress: &(dyn Fn(ProgressEvent) + Send + Sync),
    ) -> Result<OutputArtifact> {
        std::fs::create_dir_all(&self.workdir).map_err(|e| {
            Error::transcode(format!(
                "could not create work directory {}: {e}",
                self.workdir.display()
            ))
        })?;

        let stem = sanitize_filename(&descriptor.title);
        let output_path = self.output_path(&descriptor.title);

        debug!(url, output = %output_path.display(), "starting transcode job");

        source.download_audio(url, &self.workdir.join(&stem), &|raw| {
            if let Some(event) = ProgressEvent::from_raw(&raw) {
                on_progress(event);
            }
        })?;

        // The external tool occasionally settles on a different extension
        // than the one we asked for. Verify the contract before declaring
        // success, and name any same-stem strays in the diagnostic.
        let size_bytes = match std::fs::metadata(&output_path) {
            Ok(meta) => meta.len(),
            Err(_) => return Err(self.missing_output_error(&stem)),
        };

        info!(output = %output_path.display(), size_bytes, "transcode complete");

        Ok(OutputArtifact {
            path: output_path,
            size_bytes,
        })
    }

    fn missing_output_error(&self, stem: &str) -> Error {
        let strays = same_stem_files(&self.workdir, stem);
        if strays.is_empty() {
            Error::transcode("MP3 file was not created")
        } else {
            Error::transcode(format!("Found unexpected files: {}", strays.join(", ")))
        }
    }
}

fn same_stem_files(dir: &Path, stem: &str) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(stem))
        .collect();
    names.sort();
    names
}
