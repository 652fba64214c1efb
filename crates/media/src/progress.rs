use cloudtune_common::util::format_size;

/// Raw progress as reported by the download driver, mirroring the
/// extractor's own hook payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawProgress {
    pub status: ProgressStatus,
    pub downloaded_bytes: u64,
    /// Unknown while the server has not announced a content length.
    pub total_bytes: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Downloading,
    Finished,
}

/// One user-facing progress snapshot. Produced at whatever rate the worker
/// reports; consumers may drop superseded events (latest wins) but must
/// never reorder them.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Percent complete, 0 to 100.
    pub fraction: f64,
    pub text: String,
}

impl ProgressEvent {
    /// Map a raw driver report onto a displayable event.
    ///
    /// Download progress with an unknown total is unusable for a percentage
    /// and is skipped. The `Finished` marker pins the bar to 100 while the
    /// transcode runs; conversion progress is not separately observable.
    #[must_use]
    pub fn from_raw(raw: &RawProgress) -> Option<Self> {
        match raw.status {
            ProgressStatus::Downloading => {
                let total = raw.total_bytes.filter(|t| *t > 0)?;
                let fraction = (raw.downloaded_bytes as f64 / total as f64 * 100.0).min(100.0);
                Some(Self {
                    fraction,
                    text: format!(
                        "Downloading: {} / {}",
                        format_size(raw.downloaded_bytes),
                        format_size(total)
                    ),
                })
            },
            ProgressStatus::Finished => Some(Self {
                fraction: 100.0,
                text: "Download complete, converting to MP3...".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downloading_maps_to_percentage() {
        let ev = ProgressEvent::from_raw(&RawProgress {
            status: ProgressStatus::Downloading,
            downloaded_bytes: 512 * 1024,
            total_bytes: Some(1024 * 1024),
        })
        .unwrap();
        assert!((ev.fraction - 50.0).abs() < 1e-9);
        assert_eq!(ev.text, "Downloading: 512.00 KB / 1.00 MB");
    }

    #[test]
    fn unknown_total_is_skipped() {
        for total in [None, Some(0)] {
            let raw = RawProgress {
                status: ProgressStatus::Downloading,
                downloaded_bytes: 10,
                total_bytes: total,
            };
            assert_eq!(ProgressEvent::from_raw(&raw), None);
        }
    }

    #[test]
    fn finished_pins_to_one_hundred() {
        let ev = ProgressEvent::from_raw(&RawProgress {
            status: ProgressStatus::Finished,
            downloaded_bytes: 42,
            total_bytes: Some(42),
        })
        .unwrap();
        assert_eq!(ev.fraction, 100.0);
        assert!(ev.text.contains("converting"));
    }

    #[test]
    fn fraction_is_clamped() {
        let ev = ProgressEvent::from_raw(&RawProgress {
            status: ProgressStatus::Downloading,
            downloaded_bytes: 200,
            total_bytes: Some(100),
        })
        .unwrap();
        assert_eq!(ev.fraction, 100.0);
    }
}
