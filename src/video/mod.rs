pub mod decoder;
pub mod encoder;
#[cfg(test)]
pub mod fake;

use anyhow::Result;
use std::path::Path;

pub use decoder::VideoDecoder;
pub use encoder::ClipEncoder;

/// Sequential, seekable frame reader
pub trait FrameSource {
    type Frame;

    /// Frame rate reported by the container
    fn fps(&self) -> f64;

    /// Position the stream so the next read returns frame `index`
    fn seek(&mut self, index: u64) -> Result<()>;

    /// Next frame, or `None` at end of stream
    fn read_frame(&mut self) -> Result<Option<Self::Frame>>;
}

/// Output clip being written frame by frame
pub trait ClipSink {
    type Frame;

    fn write_frame(&mut self, frame: &Self::Frame) -> Result<()>;

    /// Flush and close the output file
    fn finish(self) -> Result<()>;
}

/// Opens recordings and creates clips of matching frame type
pub trait VideoBackend {
    type Frame;
    type Source: FrameSource<Frame = Self::Frame>;
    type Sink: ClipSink<Frame = Self::Frame>;

    fn open(&self, path: &Path) -> Result<Self::Source>;

    /// Create a clip at `path` sized after `first`
    fn create_clip(&self, path: &Path, fps: f64, first: &Self::Frame) -> Result<Self::Sink>;
}

/// OpenCV `videoio` backend
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvBackend;

impl VideoBackend for OpenCvBackend {
    type Frame = opencv::core::Mat;
    type Source = VideoDecoder;
    type Sink = ClipEncoder;

    fn open(&self, path: &Path) -> Result<VideoDecoder> {
        VideoDecoder::new(path)
    }

    fn create_clip(&self, path: &Path, fps: f64, first: &opencv::core::Mat) -> Result<ClipEncoder> {
        ClipEncoder::new(path, fps, first)
    }
}
