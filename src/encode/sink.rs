use std::path::PathBuf;

use crate::foundation::core::CanvasSize;
use crate::foundation::error::ExtractResult;
use crate::render::compositor::CanvasFrame;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Size of every frame that will be written.
    pub canvas: CanvasSize,
    /// Number of fragments in the source; an upper bound on frames written.
    pub fragment_count: u32,
}

/// Sink contract for consuming composited frames in fragment order.
///
/// Ordering contract: `write` is called with strictly increasing `ordinal`s. Ordinals are
/// zero-based fragment positions, so skipped fragments leave gaps.
///
/// A failing `write` is not fatal to an extraction: the frame is left out of the result and
/// the next fragment is still composited.
pub trait FrameSink {
    /// Called once before any frames are written.
    fn begin(&mut self, cfg: SinkConfig) -> ExtractResult<()>;
    /// Persist one frame; returns where it went, for sinks that write files.
    fn write(&mut self, ordinal: u32, frame: &CanvasFrame) -> ExtractResult<Option<PathBuf>>;
    /// Called once after the last frame.
    fn end(&mut self) -> ExtractResult<()>;
}

/// In-memory sink for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u32, CanvasFrame)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured `(ordinal, frame)` pairs in write order.
    pub fn frames(&self) -> &[(u32, CanvasFrame)] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<(u32, CanvasFrame)> {
        self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ExtractResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn write(&mut self, ordinal: u32, frame: &CanvasFrame) -> ExtractResult<Option<PathBuf>> {
        self.frames.push((ordinal, frame.clone()));
        Ok(None)
    }

    fn end(&mut self) -> ExtractResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_resets_on_begin() {
        let cfg = SinkConfig {
            canvas: CanvasSize::new(1, 1).unwrap(),
            fragment_count: 2,
        };
        let frame = CanvasFrame {
            width: 1,
            height: 1,
            data: vec![1, 2, 3, 4],
        };

        let mut sink = InMemorySink::new();
        sink.begin(cfg).unwrap();
        assert_eq!(sink.write(0, &frame).unwrap(), None);
        assert_eq!(sink.frames().len(), 1);

        sink.begin(cfg).unwrap();
        assert!(sink.frames().is_empty());
        assert_eq!(sink.config(), Some(cfg));
    }
}
