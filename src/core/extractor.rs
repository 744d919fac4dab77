use anyhow::Result;
use rand::Rng;
use serde::Serialize;
use std::path::Path;

use crate::annotation::{Interval, LabelSpans};
use crate::shared::constants;
use crate::utils::{file_utils, logger};
use crate::video::{ClipSink, FrameSource, VideoBackend};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    pub clips_written: usize,
    /// Intervals that decoded to zero frames
    pub intervals_skipped: usize,
    pub frames_written: u64,
}

impl ExtractReport {
    pub fn merge(&mut self, other: ExtractReport) {
        self.clips_written += other.clips_written;
        self.intervals_skipped += other.intervals_skipped;
        self.frames_written += other.frames_written;
    }
}

fn time_to_frame(seconds: f64, fps: f64) -> u64 {
    (seconds * fps).floor().max(0.0) as u64
}

/// Inclusive frame range `[floor(start * fps), floor(end * fps)]`, `None` when empty.
pub fn frame_range(interval: &Interval, fps: f64) -> Option<(u64, u64)> {
    let first = time_to_frame(interval.start, fps);
    let last = time_to_frame(interval.end, fps);
    (interval.end >= 0.0 && first <= last).then_some((first, last))
}

pub fn staging_clip_name(token: u32, label: &str, index: usize) -> String {
    format!("{}_{}_segment_{}.{}", token, label, index, constants::VIDEO_EXTENSION)
}

/// Stream one interval from `source` into a new clip at `path`.
///
/// The clip is only created once the first frame has been decoded, so an interval
/// lying past the end of the recording leaves no file behind. Returns the number of
/// frames written, `None` when nothing was decoded.
pub fn extract_interval<B: VideoBackend>(
    backend: &B,
    source: &mut B::Source,
    interval: &Interval,
    path: &Path,
) -> Result<Option<u64>> {
    let fps = source.fps();
    let Some((first, last)) = frame_range(interval, fps) else {
        return Ok(None);
    };

    source.seek(first)?;
    let Some(head) = source.read_frame()? else {
        return Ok(None);
    };

    let mut sink = backend.create_clip(path, fps, &head)?;
    sink.write_frame(&head)?;
    let mut written = 1;

    for _ in first + 1..=last {
        match source.read_frame()? {
            Some(frame) => {
                sink.write_frame(&frame)?;
                written += 1;
            }
            None => break,
        }
    }

    sink.finish()?;
    Ok(Some(written))
}

/// Extract every interval of one channel into `<staging_root>/<label>/`.
/// Label directories must already exist.
pub fn extract_channel<B: VideoBackend, R: Rng>(
    backend: &B,
    source: &mut B::Source,
    spans: &LabelSpans,
    staging_root: &Path,
    rng: &mut R,
) -> Result<ExtractReport> {
    let mut report = ExtractReport::default();

    for (label, intervals) in spans {
        let label_dir = staging_root.join(label);
        for (index, interval) in intervals.iter().enumerate() {
            let token = rng.gen_range(0..=constants::NAME_TOKEN_MAX);
            let path = label_dir.join(staging_clip_name(token, label, index));

            match extract_interval(backend, source, interval, &path)? {
                Some(frames) => {
                    report.clips_written += 1;
                    report.frames_written += frames;
                }
                None => {
                    logger::debug(&format!(
                        "no frames for {} [{}s, {}s], skipped",
                        label, interval.start, interval.end
                    ));
                    report.intervals_skipped += 1;
                }
            }
        }
    }

    Ok(report)
}

/// Create `<staging_root>/<label>` for every label of the channel.
pub fn prepare_label_dirs(spans: &LabelSpans, staging_root: &Path) -> Result<()> {
    for label in spans.keys() {
        file_utils::ensure_dir(&staging_root.join(label))?;
    }
    Ok(())
}
