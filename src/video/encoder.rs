use anyhow::{anyhow, Context, Result};
use opencv::{core::Mat, prelude::*, videoio};
use std::path::Path;

use super::ClipSink;
use crate::shared::constants;

/// mp4v writer for one extracted clip.
/// Dropping without `finish` still releases the file through OpenCV's destructor.
pub struct ClipEncoder {
    writer: videoio::VideoWriter,
}

impl ClipEncoder {
    pub fn new(path: &Path, fps: f64, first: &Mat) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("Clip path is not valid UTF-8: {:?}", path))?;

        let [c1, c2, c3, c4] = constants::CLIP_FOURCC;
        let fourcc = videoio::VideoWriter::fourcc(c1, c2, c3, c4)?;
        let size = first.size()?;

        let writer = videoio::VideoWriter::new(path_str, fourcc, fps, size, true)
            .with_context(|| format!("Failed to create clip: {}", path.display()))?;
        if !writer.is_opened()? {
            return Err(anyhow!("Failed to open clip for writing: {}", path.display()));
        }

        Ok(Self { writer })
    }
}

impl ClipSink for ClipEncoder {
    type Frame = Mat;

    fn write_frame(&mut self, frame: &Mat) -> Result<()> {
        self.writer.write(frame)?;
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        self.writer.release()?;
        Ok(())
    }
}
