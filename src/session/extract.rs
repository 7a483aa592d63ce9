use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::container::webp::WebpContainer;
use crate::container::{Fragment, FragmentSource};
use crate::decode::FragmentDecoder;
use crate::decode::webp::WebpFragmentDecoder;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{CanvasSize, FragmentIndex};
use crate::foundation::error::{ExtractError, ExtractResult, SkipKind};
use crate::render::compositor::Compositor;

/// Default canvas limit: 512 MiB of RGBA8, the same budget as `image::Limits::default()`.
pub const DEFAULT_MAX_CANVAS_PIXELS: u64 = 512 * 1024 * 1024 / 4;

/// Options for an extraction run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExtractOpts {
    /// Refuse canvases with more pixels than this; `None` lifts the limit.
    pub max_canvas_pixels: Option<u64>,
}

impl Default for ExtractOpts {
    fn default() -> Self {
        Self {
            max_canvas_pixels: Some(DEFAULT_MAX_CANVAS_PIXELS),
        }
    }
}

/// One emitted frame, in emission order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct OutputFrame {
    /// Fragment this frame was composited from.
    pub index: FragmentIndex,
    /// Where the sink put it, if it writes files.
    pub path: Option<PathBuf>,
    /// Display duration in milliseconds.
    #[serde(rename = "duration")]
    pub duration_ms: u32,
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
}

/// A fragment that did not produce an output frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SkippedFragment {
    /// Fragment that was skipped.
    pub index: FragmentIndex,
    /// Stage that failed.
    pub kind: SkipKind,
    /// Underlying error, rendered.
    pub message: String,
}

/// Result of an extraction that got past the fatal checks.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Extraction {
    /// Size of every emitted frame.
    pub canvas: CanvasSize,
    /// Fragments declared by the source.
    pub fragment_count: u32,
    /// Playback loop count reported by the source; 0 loops forever.
    pub loop_count: u16,
    /// Emitted frames, ascending fragment order.
    pub frames: Vec<OutputFrame>,
    /// Per-fragment failures, ascending fragment order.
    pub skipped: Vec<SkippedFragment>,
    /// Run stopped early on request.
    pub cancelled: bool,
}

impl Extraction {
    /// `true` when every fragment produced a frame.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.skipped.is_empty()
    }

    /// Sum of frame durations in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.duration_ms)).sum()
    }
}

/// Drives a [`FragmentSource`] through a [`Compositor`] into a [`FrameSink`].
///
/// Each run owns its canvas; one `Extractor` can serve any number of runs, also from
/// several threads.
#[derive(Clone, Debug, Default)]
pub struct Extractor {
    opts: ExtractOpts,
    cancel: Option<Arc<AtomicBool>>,
}

impl Extractor {
    /// An extractor with `opts` and no cancel flag.
    pub fn new(opts: ExtractOpts) -> Self {
        Self { opts, cancel: None }
    }

    /// Stop at the next fragment boundary once `flag` becomes `true`.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Options this extractor runs with.
    pub fn opts(&self) -> &ExtractOpts {
        &self.opts
    }

    /// Parse `bytes` as WebP and extract every frame into `sink`.
    pub fn extract(&self, bytes: &[u8], sink: &mut dyn FrameSink) -> ExtractResult<Extraction> {
        let source = WebpContainer::parse(bytes)?;
        self.run(&source, &WebpFragmentDecoder, sink)
    }

    /// Extract with caller-provided collaborators.
    #[tracing::instrument(skip_all, fields(fragments = source.info().fragment_count))]
    pub fn run(
        &self,
        source: &dyn FragmentSource,
        decoder: &dyn FragmentDecoder,
        sink: &mut dyn FrameSink,
    ) -> ExtractResult<Extraction> {
        let info = source.info().clone();
        if info.fragment_count == 0 {
            return Err(ExtractError::empty_animation("source declares no fragments"));
        }
        let canvas = self.resolve_canvas(source)?;
        let mut comp = Compositor::new(canvas)?;

        sink.begin(SinkConfig {
            canvas,
            fragment_count: info.fragment_count,
        })?;

        let mut out = Extraction {
            canvas,
            fragment_count: info.fragment_count,
            loop_count: info.loop_count,
            frames: Vec::with_capacity(info.fragment_count as usize),
            skipped: Vec::new(),
            cancelled: false,
        };

        for i in 1..=info.fragment_count {
            if self.is_cancelled() {
                tracing::info!(next = i, "extraction cancelled");
                out.cancelled = true;
                break;
            }
            let index = FragmentIndex(i);

            let fragment = match source.fragment(index) {
                Ok(f) => f,
                Err(e) => {
                    skip(&mut out, index, SkipKind::FragmentRead, e);
                    continue;
                }
            };

            comp.dispose_prior()?;

            if fragment.width == 0 || fragment.height == 0 {
                let msg = format!("invalid size {}x{}", fragment.width, fragment.height);
                skip(&mut out, index, SkipKind::FragmentDimension, msg);
                continue;
            }

            let pixels = match decode_checked(decoder, &fragment) {
                Ok(px) => px,
                Err(e) => {
                    skip(&mut out, index, SkipKind::FragmentDecode, e);
                    continue;
                }
            };

            comp.draw(&fragment, &pixels)?;
            let snapshot = comp.snapshot();

            match sink.write(index.ordinal0(), &snapshot) {
                Ok(path) => {
                    tracing::debug!(
                        index = i,
                        duration_ms = fragment.duration_ms,
                        blend = ?fragment.blend,
                        dispose = ?fragment.dispose,
                        "emitted frame"
                    );
                    out.frames.push(OutputFrame {
                        index,
                        path,
                        duration_ms: fragment.duration_ms,
                        width: canvas.width,
                        height: canvas.height,
                    });
                }
                Err(e) => skip(&mut out, index, SkipKind::SinkWrite, e),
            }
        }

        sink.end()?;
        tracing::debug!(
            emitted = out.frames.len(),
            skipped = out.skipped.len(),
            "extraction finished"
        );
        Ok(out)
    }

    /// Canvas declared by the source, else the first fragment's own size.
    fn resolve_canvas(&self, source: &dyn FragmentSource) -> ExtractResult<CanvasSize> {
        let canvas = match source.info().canvas {
            Some(c) => CanvasSize::new(c.width, c.height)?,
            None => {
                let first = source.fragment(FragmentIndex::FIRST).map_err(|e| {
                    ExtractError::empty_animation(format!(
                        "no canvas declared and first fragment unreadable: {e}"
                    ))
                })?;
                tracing::debug!(
                    width = first.width,
                    height = first.height,
                    "canvas taken from first fragment"
                );
                CanvasSize::new(first.width, first.height)?
            }
        };

        if let Some(max) = self.opts.max_canvas_pixels
            && canvas.pixel_count() > max
        {
            return Err(ExtractError::validation(format!(
                "canvas {}x{} exceeds max_canvas_pixels {max}",
                canvas.width, canvas.height
            )));
        }
        Ok(canvas)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Decode and verify the buffer length against the fragment's declared size.
fn decode_checked(decoder: &dyn FragmentDecoder, fragment: &Fragment<'_>) -> ExtractResult<Vec<u8>> {
    let pixels = decoder.decode(fragment)?;
    if fragment.rgba_len() != Some(pixels.len()) {
        return Err(ExtractError::fragment(
            fragment.index,
            SkipKind::FragmentDecode,
            format!(
                "decoder returned {} bytes for a {}x{} fragment",
                pixels.len(),
                fragment.width,
                fragment.height
            ),
        ));
    }
    Ok(pixels)
}

fn skip(out: &mut Extraction, index: FragmentIndex, kind: SkipKind, err: impl ToString) {
    let message = err.to_string();
    tracing::warn!(index = index.0, kind = %kind, %message, "skipping fragment");
    out.skipped.push(SkippedFragment {
        index,
        kind,
        message,
    });
}

/// Extract every frame of a WebP animation into `sink` with default options.
pub fn decode_animation(bytes: &[u8], sink: &mut dyn FrameSink) -> ExtractResult<Extraction> {
    Extractor::default().extract(bytes, sink)
}
