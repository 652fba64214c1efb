use serde::Deserialize;

use crate::error::{Error, Result};

/// Structured metadata about one remote video, produced by a single
/// resolution call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDescriptor {
    pub id: String,
    pub title: String,
    pub duration_seconds: u32,
    pub approx_size_bytes: u64,
    pub age_restricted: bool,
    pub thumbnail_url: String,
    pub description: String,
    pub uploader: String,
}

/// Wire shape of the fields we consume from `yt-dlp -J` output.
#[derive(Deserialize)]
struct RawInfo {
    id: String,
    title: String,
    duration: Option<f64>,
    #[serde(default)]
    filesize_approx: Option<u64>,
    #[serde(default)]
    age_limit: u32,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
}

impl VideoDescriptor {
    /// Parse the JSON document emitted by the extractor.
    ///
    /// A payload without a duration is rejected: the size estimator and the
    /// progress display both need it, and its absence usually means a live
    /// stream or an unsupported page.
    pub fn from_extractor_json(json: &str) -> Result<Self> {
        let raw: RawInfo = serde_json::from_str(json)
            .map_err(|e| Error::metadata(format!("unreadable extractor output: {e}")))?;

        let duration = raw
            .duration
            .filter(|d| *d > 0.0)
            .ok_or_else(|| Error::metadata("video has no duration"))?;

        Ok(Self {
            id: raw.id,
            title: raw.title,
            duration_seconds: duration.round() as u32,
            approx_size_bytes: raw.filesize_approx.unwrap_or(0),
            age_restricted: raw.age_limit > 0,
            thumbnail_url: raw.thumbnail.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            uploader: raw.uploader.unwrap_or_else(|| "Unknown".to_string()),
        })
    }
}
