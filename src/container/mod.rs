//! Fragment sources: containers that yield per-frame metadata and compressed payloads.

/// WebP RIFF container demuxer.
pub mod webp;

use crate::foundation::core::{BlendMode, CanvasSize, DisposeMode, FragmentIndex};
use crate::foundation::error::ExtractResult;

/// Container-level facts, available once the input is opened.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct AnimationInfo {
    /// Canvas declared by the container, if it declares one.
    pub canvas: Option<CanvasSize>,
    /// Number of fragments, including ones that later fail to read.
    pub fragment_count: u32,
    /// Playback loop count; 0 means loop forever.
    pub loop_count: u16,
    /// Suggested background color, straight RGBA.
    pub background_rgba: [u8; 4],
    /// Container advertises an alpha channel.
    pub has_alpha: bool,
    /// Container advertises animation.
    pub is_animated: bool,
}

/// One sub-frame as read from the container.
///
/// `payload` and `alpha` borrow the compressed frame data from the source buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub index: FragmentIndex,
    pub x_offset: u32,
    pub y_offset: u32,
    pub width: u32,
    pub height: u32,
    pub duration_ms: u32,
    pub blend: BlendMode,
    pub dispose: DisposeMode,
    /// Raw `VP8 ` or `VP8L` bitstream, without its chunk header.
    pub payload: &'a [u8],
    /// `ALPH` chunk payload that accompanies a lossy bitstream.
    pub alpha: Option<&'a [u8]>,
    /// `payload` is `VP8L`.
    pub lossless: bool,
}

impl Fragment<'_> {
    /// Expected length of this fragment's decoded RGBA8 buffer, if it fits in memory.
    pub fn rgba_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|px| px.checked_mul(4))
    }
}

/// An opened container that hands out fragments by 1-based index.
///
/// Fragments may be requested in any order; the extractor requests them in ascending order.
pub trait FragmentSource {
    /// Container-level metadata.
    fn info(&self) -> &AnimationInfo;

    /// Fetch fragment `index` (1-based).
    ///
    /// Errors are per-fragment and do not invalidate the source.
    fn fragment(&self, index: FragmentIndex) -> ExtractResult<Fragment<'_>>;
}
