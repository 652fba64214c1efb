use std::path::PathBuf;

use secrecy::Secret;

use crate::schema::{AppConfig, MediaConfig, PcloudConfig, TelegramConfig};

pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const PCLOUD_USERNAME: &str = "PCLOUD_USERNAME";
pub const PCLOUD_PASSWORD: &str = "PCLOUD_PASSWORD";
pub const PCLOUD_BASE_FOLDER: &str = "PCLOUD_BASE_FOLDER";
pub const ALLOWED_USER_IDS: &str = "ALLOWED_USER_IDS";
pub const TEMP_DIR: &str = "TEMP_DIR";
pub const CLEANUP_OLDER_THAN_HOURS: &str = "CLEANUP_OLDER_THAN_HOURS";
pub const FFMPEG_PATH: &str = "FFMPEG_PATH";
pub const YTDLP_PATH: &str = "YTDLP_PATH";

const DEFAULT_TEMP_DIR: &str = "/tmp/cloudtune";
const DEFAULT_CLEANUP_HOURS: u64 = 24;
const DEFAULT_FFMPEG_PATH: &str = "/usr/bin/ffmpeg";
const DEFAULT_YTDLP_PATH: &str = "yt-dlp";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// All absent required variables are collected before failing so the
    /// operator fixes them in one round.
    #[error("missing required environment variables: {}", keys.join(", "))]
    MissingRequired { keys: Vec<&'static str> },

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Build an [`AppConfig`] from the process environment.
pub fn from_env() -> Result<AppConfig, Error> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Build an [`AppConfig`] from an arbitrary variable lookup.
///
/// Empty values count as unset, matching shell `VAR=` conventions.
pub fn from_lookup<F>(lookup: F) -> Result<AppConfig, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let required = [
        TELEGRAM_BOT_TOKEN,
        PCLOUD_USERNAME,
        PCLOUD_PASSWORD,
        PCLOUD_BASE_FOLDER,
    ];
    let missing: Vec<&'static str> = required.into_iter().filter(|k| get(k).is_none()).collect();
    if !missing.is_empty() {
        return Err(Error::MissingRequired { keys: missing });
    }

    let token = get(TELEGRAM_BOT_TOKEN).unwrap_or_default();
    let username = get(PCLOUD_USERNAME).unwrap_or_default();
    let password = get(PCLOUD_PASSWORD).unwrap_or_default();
    let base_folder = get(PCLOUD_BASE_FOLDER).unwrap_or_default();

    let allowed_user_ids = parse_user_ids(get(ALLOWED_USER_IDS).as_deref().unwrap_or(""))?;

    let cleanup_older_than_hours = match get(CLEANUP_OLDER_THAN_HOURS) {
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| Error::Invalid {
            key: CLEANUP_OLDER_THAN_HOURS,
            message: e.to_string(),
        })?,
        None => DEFAULT_CLEANUP_HOURS,
    };

    Ok(AppConfig {
        telegram: TelegramConfig {
            token: Secret::new(token),
            allowed_user_ids,
        },
        pcloud: PcloudConfig {
            username,
            password: Secret::new(password),
            base_folder,
        },
        media: MediaConfig {
            temp_dir: PathBuf::from(get(TEMP_DIR).unwrap_or_else(|| DEFAULT_TEMP_DIR.into())),
            cleanup_older_than_hours,
            ffmpeg_path: PathBuf::from(
                get(FFMPEG_PATH).unwrap_or_else(|| DEFAULT_FFMPEG_PATH.into()),
            ),
            ytdlp_path: PathBuf::from(get(YTDLP_PATH).unwrap_or_else(|| DEFAULT_YTDLP_PATH.into())),
        },
    })
}

/// Parse the comma-separated allow-list. Non-numeric entries are a
/// configuration error rather than silently dropped.
fn parse_user_ids(raw: &str) -> Result<Vec<u64>, Error> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>().map_err(|_| Error::Invalid {
                key: ALLOWED_USER_IDS,
                message: format!("not a numeric user id: {s:?}"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (TELEGRAM_BOT_TOKEN, "123:ABC"),
            (PCLOUD_USERNAME, "me@example.com"),
            (PCLOUD_PASSWORD, "hunter2"),
            (PCLOUD_BASE_FOLDER, "Music/youtube"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<AppConfig, Error> {
        from_lookup(|key| env.get(key).map(|v| (*v).to_string()))
    }

    #[test]
    fn loads_with_defaults() {
        let cfg = load(&base_env()).unwrap();
        assert_eq!(cfg.telegram.token.expose_secret(), "123:ABC");
        assert!(cfg.telegram.allowed_user_ids.is_empty());
        assert_eq!(cfg.pcloud.base_folder, "Music/youtube");
        assert_eq!(cfg.media.temp_dir, PathBuf::from("/tmp/cloudtune"));
        assert_eq!(cfg.media.cleanup_older_than_hours, 24);
        assert_eq!(cfg.media.ffmpeg_path, PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(cfg.media.ytdlp_path, PathBuf::from("yt-dlp"));
    }

    #[test]
    fn reports_every_missing_required_key() {
        let mut env = base_env();
        env.remove(TELEGRAM_BOT_TOKEN);
        env.remove(PCLOUD_PASSWORD);

        let err = load(&env).unwrap_err();
        match err {
            Error::MissingRequired { keys } => {
                assert_eq!(keys, vec![TELEGRAM_BOT_TOKEN, PCLOUD_PASSWORD]);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut env = base_env();
        env.insert(PCLOUD_BASE_FOLDER, "  ");

        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains(PCLOUD_BASE_FOLDER));
    }

    #[test]
    fn parses_allow_list() {
        let mut env = base_env();
        env.insert(ALLOWED_USER_IDS, "123, 456,789");
        let cfg = load(&env).unwrap();
        assert_eq!(cfg.telegram.allowed_user_ids, vec![123, 456, 789]);
    }

    #[test]
    fn allow_list_tolerates_trailing_comma() {
        let mut env = base_env();
        env.insert(ALLOWED_USER_IDS, "123,");
        let cfg = load(&env).unwrap();
        assert_eq!(cfg.telegram.allowed_user_ids, vec![123]);
    }

    #[test]
    fn rejects_non_numeric_user_id() {
        let mut env = base_env();
        env.insert(ALLOWED_USER_IDS, "123,bob");
        let err = load(&env).unwrap_err();
        assert!(matches!(err, Error::Invalid { key, .. } if key == ALLOWED_USER_IDS));
    }

    #[test]
    fn overrides_media_defaults() {
        let mut env = base_env();
        env.insert(TEMP_DIR, "/var/tmp/tunes");
        env.insert(CLEANUP_OLDER_THAN_HOURS, "6");
        env.insert(FFMPEG_PATH, "/opt/ffmpeg/bin/ffmpeg");
        env.insert(YTDLP_PATH, "/usr/local/bin/yt-dlp");

        let cfg = load(&env).unwrap();
        assert_eq!(cfg.media.temp_dir, PathBuf::from("/var/tmp/tunes"));
        assert_eq!(cfg.media.cleanup_older_than_hours, 6);
        assert_eq!(cfg.media.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(cfg.media.ytdlp_path, PathBuf::from("/usr/local/bin/yt-dlp"));
    }

    #[test]
    fn rejects_unparseable_cleanup_hours() {
        let mut env = base_env();
        env.insert(CLEANUP_OLDER_THAN_HOURS, "soon");
        let err = load(&env).unwrap_err();
        assert!(matches!(err, Error::Invalid { key, .. } if key == CLEANUP_OLDER_THAN_HOURS));
    }
}
