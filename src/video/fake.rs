//! In-memory stand-in for OpenCV used by tests.
//! A "recording" is a text file `fps=<f64>\nframes=<u64>`; frames are their indices
//! and clips are written as one frame index per line.

use anyhow::{anyhow, bail, Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use super::{ClipSink, FrameSource, VideoBackend};

pub fn write_recording(path: &Path, fps: f64, frames: u64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("fps={}\nframes={}\n", fps, frames)).unwrap();
}

pub fn read_clip(path: &Path) -> Vec<u64> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.parse().unwrap())
        .collect()
}

#[derive(Debug, Default)]
pub struct FakeBackend;

pub struct FakeSource {
    fps: f64,
    frames: u64,
    position: u64,
    seekable: bool,
}

impl FakeSource {
    pub fn new(fps: f64, frames: u64) -> Self {
        Self {
            fps,
            frames,
            position: 0,
            seekable: true,
        }
    }

    /// A source whose backend refuses every seek.
    pub fn unseekable(fps: f64, frames: u64) -> Self {
        Self {
            seekable: false,
            ..Self::new(fps, frames)
        }
    }
}

impl FrameSource for FakeSource {
    type Frame = u64;

    fn fps(&self) -> f64 {
        self.fps
    }

    fn seek(&mut self, index: u64) -> Result<()> {
        if !self.seekable {
            bail!("Video backend refused to seek to frame {} of {}", index, self.frames);
        }
        self.position = index;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<u64>> {
        if self.position >= self.frames {
            return Ok(None);
        }
        self.position += 1;
        Ok(Some(self.position - 1))
    }
}

pub struct FakeSink {
    file: File,
}

impl ClipSink for FakeSink {
    type Frame = u64;

    fn write_frame(&mut self, frame: &u64) -> Result<()> {
        writeln!(self.file, "{}", frame)?;
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}

impl VideoBackend for FakeBackend {
    type Frame = u64;
    type Source = FakeSource;
    type Sink = FakeSink;

    fn open(&self, path: &Path) -> Result<FakeSource> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to open video file: {}", path.display()))?;

        let mut fps = None;
        let mut frames = None;
        for line in text.lines() {
            match line.split_once('=') {
                Some(("fps", v)) => fps = v.parse::<f64>().ok(),
                Some(("frames", v)) => frames = v.parse::<u64>().ok(),
                _ => {}
            }
        }

        match (fps, frames) {
            (Some(fps), Some(frames)) if fps > 0.0 => Ok(FakeSource::new(fps, frames)),
            _ => Err(anyhow!("Failed to decode video file: {}", path.display())),
        }
    }

    fn create_clip(&self, path: &Path, _fps: f64, _first: &u64) -> Result<FakeSink> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create clip: {}", path.display()))?;
        Ok(FakeSink { file })
    }
}
