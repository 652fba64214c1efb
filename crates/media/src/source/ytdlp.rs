//! yt-dlp subprocess backend.
//!
//! Metadata comes from one `yt-dlp -J` invocation; downloads run yt-dlp
//! with `--newline` progress on stdout, which is parsed line by line into
//! [`RawProgress`] reports.

use std::{
    collections::VecDeque,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    descriptor::VideoDescriptor,
    error::{Error, Result},
    estimate::DEFAULT_BITRATE_KBPS,
    progress::{ProgressStatus, RawProgress},
    source::{MediaSource, ProgressHook},
};

/// How many trailing stderr lines are kept for diagnostics.
const STDERR_TAIL_LINES: usize = 8;

pub struct YtdlpSource {
    ytdlp_path: PathBuf,
    ffmpeg_path: PathBuf,
}

impl YtdlpSource {
    #[must_use]
    pub fn new(ytdlp_path: impl Into<PathBuf>, ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl MediaSource for YtdlpSource {
    async fn resolve(&self, url: &str) -> Result<VideoDescriptor> {
        debug!(url, "resolving video metadata");

        let output = tokio::process::Command::new(&self.ytdlp_path)
            .args(["-J", "--no-warnings", "--no-playlist"])
            .arg(url)
            .output()
            .await
            .map_err(|e| {
                Error::metadata(format!(
                    "failed to run {}: {e}",
                    self.ytdlp_path.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::metadata(format!(
                "extractor exited with {}: {}",
                output.status,
                last_nonempty_line(&stderr)
            )));
        }

        VideoDescriptor::from_extractor_json(&String::from_utf8_lossy(&output.stdout))
    }

    fn download_audio(
        &self,
        url: &str,
        output_stem: &Path,
        on_progress: ProgressHook<'_>,
    ) -> Result<()> {
        let template = format!("{}.%(ext)s", output_stem.display());
        let quality = format!("{DEFAULT_BITRATE_KBPS}K");

        debug!(url, template, "starting yt-dlp download");

        let mut child = Command::new(&self.ytdlp_path)
            .args(["-f", "bestaudio/best", "--extract-audio", "--audio-format", "mp3"])
            .args(["--audio-quality", &quality])
            .arg("--ffmpeg-location")
            .arg(&self.ffmpeg_path)
            .args(["--newline", "--no-warnings", "--no-playlist", "-o"])
            .arg(&template)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::transcode(format!(
                    "failed to run {}: {e}",
                    self.ytdlp_path.display()
                ))
            })?;

        // Drain stderr on its own thread so a chatty pipe can never block
        // the child while we sit on stdout.
        let stderr_tail = child.stderr.take().map(|pipe| {
            std::thread::spawn(move || collect_tail(pipe, STDERR_TAIL_LINES))
        });

        if let Some(stdout) = child.stdout.take() {
            let mut finished_reported = false;
            for line in BufReader::new(stdout).lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "lost yt-dlp stdout mid-download");
                        break;
                    },
                };

                if !finished_reported && is_conversion_start(&line) {
                    finished_reported = true;
                    on_progress(RawProgress {
                        status: ProgressStatus::Finished,
                        downloaded_bytes: 0,
                        total_bytes: None,
                    });
                } else if let Some(raw) = parse_progress(&line) {
                    on_progress(raw);
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| Error::transcode(format!("waiting for yt-dlp: {e}")))?;

        let tail = stderr_tail
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(Error::transcode(format!(
                "yt-dlp exited with {status}: {}",
                tail.join(" | ")
            )));
        }

        Ok(())
    }
}

/// Parse one `--newline` progress line, e.g.
/// `[download]  45.2% of 10.00MiB at 500.00KiB/s ETA 00:10`.
///
/// The driver prints percentages, not byte counts, so the downloaded figure
/// is reconstructed from the announced total.
fn parse_progress(line: &str) -> Option<RawProgress> {
    if !line.contains("[download]") || !line.contains('%') {
        return None;
    }

    let mut percent: Option<f64> = None;
    let mut total: Option<u64> = None;

    let tokens: Vec<&str> = line.split_whitespace().collect();
    for (i, token) in tokens.iter().enumerate() {
        if let Some(number) = token.strip_suffix('%') {
            if let Ok(p) = number.parse::<f64>() {
                percent = Some(p.clamp(0.0, 100.0));
            }
        }
        if *token == "of" && i + 1 < tokens.len() {
            total = parse_size(tokens[i + 1]);
        }
    }

    let percent = percent?;
    let downloaded = total
        .map(|t| (t as f64 * percent / 100.0) as u64)
        .unwrap_or(0);

    Some(RawProgress {
        status: ProgressStatus::Downloading,
        downloaded_bytes: downloaded,
        total_bytes: total,
    })
}

/// The post-processing banner marks the end of the download phase.
fn is_conversion_start(line: &str) -> bool {
    line.starts_with("[ExtractAudio]")
}

/// Parse sizes like `10.00MiB`, `~343.72MiB`, `500.0KiB`, `978B`.
fn parse_size(token: &str) -> Option<u64> {
    let token = token.trim_start_matches('~');
    let split = token.find(|c: char| !c.is_ascii_digit() && c != '.')?;
    let (number, unit) = token.split_at(split);
    let value: f64 = number.parse().ok()?;

    let multiplier: f64 = match unit {
        "B" => 1.0,
        "KiB" | "KB" => 1024.0,
        "MiB" | "MB" => 1024.0 * 1024.0,
        "GiB" | "GB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" | "TB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };

    Some((value * multiplier) as u64)
}

fn collect_tail(pipe: impl Read, keep: usize) -> Vec<String> {
    let mut tail = VecDeque::with_capacity(keep);
    for line in BufReader::new(pipe).lines().map_while(|l| l.ok()) {
        if line.trim().is_empty() {
            continue;
        }
        if tail.len() == keep {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into()
}

fn last_nonempty_line(text: &str) -> &str {
    text.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("no output")
}
