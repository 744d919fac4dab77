use anyhow::{anyhow, bail, Context, Result};
use opencv::{core::Mat, prelude::*, videoio};
use std::path::Path;

use super::FrameSource;
use crate::utils::logger;

/// Seekable reader over a camera recording.
/// The capture handle is released when the decoder is dropped.
pub struct VideoDecoder {
    capture: videoio::VideoCapture,
    fps: f64,
    /// 0 when the container does not report it
    frame_count: u64,
    past_end: bool,
}

impl VideoDecoder {
    pub fn new(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("Video path is not valid UTF-8: {:?}", path))?;

        // CAP_ANY lets OpenCV pick the backend (FFmpeg, GStreamer, AVFoundation...)
        let capture = videoio::VideoCapture::from_file(path_str, videoio::CAP_ANY)
            .with_context(|| format!("Failed to open video file: {}", path.display()))?;

        if !capture.is_opened()? {
            let err_msg = format!("Failed to open video file: {}", path.display());
            logger::error(&err_msg);
            return Err(anyhow!(err_msg));
        }

        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        if !fps.is_finite() || fps <= 0.0 {
            let err_msg = format!("Video reports no usable frame rate ({}): {}", fps, path.display());
            logger::error(&err_msg);
            return Err(anyhow!(err_msg));
        }

        let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as u64;
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;

        logger::info(&format!(
            "opened {}: {}x{} @ {:.3} fps, {} frames",
            path.display(),
            width,
            height,
            fps,
            frame_count
        ));

        Ok(Self {
            capture,
            fps,
            frame_count,
            past_end: false,
        })
    }
}

impl FrameSource for VideoDecoder {
    type Frame = Mat;

    fn fps(&self) -> f64 {
        self.fps
    }

    fn seek(&mut self, index: u64) -> Result<()> {
        let accepted = self
            .capture
            .set(videoio::CAP_PROP_POS_FRAMES, index as f64)
            .with_context(|| format!("Failed to seek to frame {}", index))?;
        self.past_end = check_seek(accepted, index, self.frame_count)?;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Mat>> {
        if self.past_end {
            return Ok(None);
        }

        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? {
            return Ok(None); // EOF
        }

        if frame.empty() {
            return Ok(None);
        }

        Ok(Some(frame))
    }
}

/// Interpret the result of a `CAP_PROP_POS_FRAMES` seek.
/// A refused seek beyond the known end reads as EOF; any other refusal is an error.
/// Returns whether the stream is positioned past its end.
fn check_seek(accepted: bool, index: u64, frame_count: u64) -> Result<bool> {
    if accepted {
        return Ok(false);
    }
    if frame_count > 0 && index >= frame_count {
        return Ok(true);
    }
    bail!("Video backend refused to seek to frame {} of {}", index, frame_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_seek() {
        assert!(!check_seek(true, 30, 300).unwrap());
        assert!(!check_seek(true, 900, 300).unwrap());
    }

    #[test]
    fn test_refused_seek_past_end_is_eof() {
        assert!(check_seek(false, 300, 300).unwrap());
        assert!(check_seek(false, 5000, 300).unwrap());
    }

    #[test]
    fn test_refused_seek_inside_stream_fails() {
        let err = check_seek(false, 30, 300).unwrap_err();
        assert!(err.to_string().contains("frame 30"));
        // unknown length: cannot tell EOF from an unseekable stream
        assert!(check_seek(false, 30, 0).is_err());
    }
}
