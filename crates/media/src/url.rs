use std::sync::LazyLock;

use regex::Regex;

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/(watch\?v=|embed/|v/|.+\?v=)?([^&=%\?]{11})",
    )
    .expect("youtube url pattern is valid")
});

static VIDEO_ID: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("video id pattern is valid"),
        Regex::new(r"(?:be/)([0-9A-Za-z_-]{11})").expect("video id pattern is valid"),
    ]
});

/// Shape check for inbound URL submissions. Anchored at the start so random
/// chatter containing a link elsewhere is not treated as a request.
#[must_use]
pub fn is_youtube_url(url: &str) -> bool {
    YOUTUBE_URL.is_match(url)
}

/// Extract the 11-character video id, if present.
#[must_use]
pub fn video_id(url: &str) -> Option<&str> {
    VIDEO_ID
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
