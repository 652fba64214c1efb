use crate::descriptor::VideoDescriptor;

/// Fixed MP3 target bitrate. Not user-configurable: a constant bitrate keeps
/// the size estimate honest and the output predictable.
pub const DEFAULT_BITRATE_KBPS: u32 = 128;

/// Estimate the final MP3 size in bytes for a video of known duration.
///
/// `bitrate_kbps * 1000 / 8` bytes per second, times the duration, plus 1%
/// for container headers and tags. Monotonic non-decreasing in both duration
/// and bitrate; zero duration yields zero.
#[must_use]
pub fn estimate_mp3_size(descriptor: &VideoDescriptor, bitrate_kbps: u32) -> u64 {
    let bytes_per_second = f64::from(bitrate_kbps) * 1000.0 / 8.0;
    (bytes_per_second * f64::from(descriptor.duration_seconds) * 1.01).round() as u64
}
