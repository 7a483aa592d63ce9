#![forbid(unsafe_code)]
//! `webp-frames` expands animated WebP files into fully composited still frames.
//!
//! The pipeline reads ANMF fragments from the RIFF container, decodes each one to straight RGBA8,
//! composites it onto a persistent canvas following the fragment's blend and dispose flags, and
//! hands a snapshot of the canvas to a [`FrameSink`]. Per-fragment failures are recorded in
//! [`Extraction::skipped`] and never abort the run.
//!
//! ```no_run
//! use webp_frames::{ImageDirSink, ImageDirSinkOpts, decode_animation};
//!
//! let bytes = std::fs::read("anim.webp")?;
//! let mut sink = ImageDirSink::new(ImageDirSinkOpts::new("frames"));
//! let extraction = decode_animation(&bytes, &mut sink)?;
//! for frame in &extraction.frames {
//!     println!("{:?} {}ms", frame.path, frame.duration_ms);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod container;
mod decode;
mod encode;
mod foundation;
mod render;
mod session;

pub use container::webp::{MAX_CANVAS_PIXELS, WebpContainer};
pub use container::{AnimationInfo, Fragment, FragmentSource};
pub use decode::FragmentDecoder;
pub use decode::webp::WebpFragmentDecoder;
pub use encode::image_dir::{ImageDirSink, ImageDirSinkOpts, OutputFormat};
pub use encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use foundation::core::{BlendMode, CanvasSize, DisposeMode, DrawRect, FragmentIndex};
pub use foundation::error::{ExtractError, ExtractResult, SkipKind};
pub use render::blend::{Rgba8, source_over};
pub use render::compositor::{CanvasFrame, Compositor, PriorFrame};
pub use session::extract::{
    DEFAULT_MAX_CANVAS_PIXELS, ExtractOpts, Extraction, Extractor, OutputFrame, SkippedFragment,
    decode_animation,
};
