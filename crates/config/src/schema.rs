use std::path::PathBuf;

use secrecy::Secret;

/// Immutable process configuration, constructed once by [`crate::loader`].
#[derive(Clone)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub pcloud: PcloudConfig,
    pub media: MediaConfig,
}

/// Telegram front-end settings.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,

    /// Numeric user IDs allowed to use the bot. Empty means open access.
    pub allowed_user_ids: Vec<u64>,
}

/// pCloud storage settings.
#[derive(Clone)]
pub struct PcloudConfig {
    pub username: String,
    pub password: Secret<String>,

    /// Remote folder under which date-partitioned subfolders are created,
    /// e.g. `Music/youtube`.
    pub base_folder: String,
}

/// Local media handling settings.
#[derive(Clone, Debug)]
pub struct MediaConfig {
    /// Directory for in-flight artifacts.
    pub temp_dir: PathBuf,

    /// Age threshold for the `/cleanup` command.
    pub cleanup_older_than_hours: u64,

    /// ffmpeg binary handed to yt-dlp for audio extraction.
    pub ffmpeg_path: PathBuf,

    /// yt-dlp binary; a bare name is resolved via `PATH`.
    pub ytdlp_path: PathBuf,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("allowed_user_ids", &self.allowed_user_ids)
            .finish()
    }
}

impl std::fmt::Debug for PcloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcloudConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("base_folder", &self.base_folder)
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("telegram", &self.telegram)
            .field("pcloud", &self.pcloud)
            .field("media", &self.media)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secrets() {
        let cfg = TelegramConfig {
            token: Secret::new("123:ABC".into()),
            allowed_user_ids: vec![7],
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("123:ABC"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
