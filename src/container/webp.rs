use std::fmt;

use zenwebp::decoder::LoopCount;
use zenwebp::mux::{BlendMethod, DisposeMethod, MuxError, WebPDemuxer};

use crate::container::{AnimationInfo, Fragment, FragmentSource};
use crate::foundation::core::{BlendMode, CanvasSize, DisposeMode, FragmentIndex};
use crate::foundation::error::{ExtractError, ExtractResult, SkipKind};

const RIFF_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Largest canvas the container accepts, in pixels.
pub const MAX_CANVAS_PIXELS: u64 = u32::MAX as u64;

/// A demuxed WebP file, borrowing the input bytes.
///
/// Animated files expose one fragment per `ANMF` chunk. Still files (plain `VP8 `/`VP8L`,
/// or `VP8X` without animation) expose a single full-image fragment.
pub struct WebpContainer<'a> {
    info: AnimationInfo,
    demux: WebPDemuxer<'a>,
}

impl fmt::Debug for WebpContainer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebpContainer")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl<'a> WebpContainer<'a> {
    /// Parse the RIFF structure of `data`.
    ///
    /// Fails on anything that is not a structurally sound WebP file, and on canvases larger
    /// than [`MAX_CANVAS_PIXELS`]. A damaged `ANMF` chunk does not fail parsing; fetching that
    /// fragment fails instead.
    pub fn parse(data: &'a [u8]) -> ExtractResult<Self> {
        if data.len() < RIFF_HEADER_LEN || &data[0..4] != b"RIFF" || &data[8..12] != b"WEBP" {
            return Err(ExtractError::invalid_source("not a RIFF/WEBP file"));
        }
        let riff_size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        if riff_size < 4 {
            return Err(ExtractError::invalid_source("RIFF size too small"));
        }
        let end = riff_size.saturating_add(CHUNK_HEADER_LEN);
        if end > data.len() {
            return Err(ExtractError::invalid_source(format!(
                "truncated file: RIFF declares {end} bytes, {} available",
                data.len()
            )));
        }
        if end == RIFF_HEADER_LEN {
            return Err(ExtractError::invalid_source("no image data"));
        }
        check_chunk_extents(&data[..end])?;

        let demux = WebPDemuxer::new(&data[..end])
            .map_err(|e| ExtractError::invalid_source(MuxError::from(e).to_string()))?;

        let extended = &data[12..16] == b"VP8X";
        let canvas = if extended {
            let (width, height) = (demux.canvas_width(), demux.canvas_height());
            let pixels = u64::from(width) * u64::from(height);
            if pixels > MAX_CANVAS_PIXELS {
                return Err(ExtractError::invalid_source(format!(
                    "canvas {width}x{height} exceeds {MAX_CANVAS_PIXELS} pixels"
                )));
            }
            Some(CanvasSize::new(width, height)?)
        } else {
            None
        };

        let is_animated = demux.is_animated();
        let fragment_count = if is_animated {
            demux.num_frames()
        } else if demux.frame(1).is_some() {
            1
        } else {
            return Err(ExtractError::invalid_source("no image data"));
        };

        let loop_count = match demux.loop_count() {
            _ if !is_animated => 0,
            LoopCount::Forever => 0,
            LoopCount::Times(n) => n.get(),
        };
        // stored as B, G, R, A
        let [b, g, r, a] = demux.background_color();

        let info = AnimationInfo {
            canvas,
            fragment_count,
            loop_count,
            background_rgba: [r, g, b, a],
            has_alpha: demux.has_alpha(),
            is_animated,
        };

        tracing::debug!(
            fragments = info.fragment_count,
            animated = info.is_animated,
            canvas = ?info.canvas,
            "parsed webp container"
        );

        Ok(Self { info, demux })
    }
}

impl FragmentSource for WebpContainer<'_> {
    fn info(&self) -> &AnimationInfo {
        &self.info
    }

    fn fragment(&self, index: FragmentIndex) -> ExtractResult<Fragment<'_>> {
        if index.0 == 0 || index.0 > self.info.fragment_count {
            return Err(ExtractError::fragment(
                index,
                SkipKind::FragmentRead,
                format!("index out of range 1..={}", self.info.fragment_count),
            ));
        }
        let Some(frame) = self.demux.frame(index.0) else {
            return Err(ExtractError::fragment(
                index,
                SkipKind::FragmentRead,
                "ANMF chunk has no readable VP8/VP8L bitstream",
            ));
        };

        // stills composite like a blended frame on a fresh canvas
        let blend = match frame.blend {
            _ if !self.info.is_animated => BlendMode::Blend,
            BlendMethod::AlphaBlend => BlendMode::Blend,
            BlendMethod::Overwrite => BlendMode::NoBlend,
        };
        let dispose = match frame.dispose {
            DisposeMethod::None => DisposeMode::None,
            DisposeMethod::Background => DisposeMode::Background,
        };

        Ok(Fragment {
            index,
            x_offset: frame.x_offset,
            y_offset: frame.y_offset,
            width: frame.width,
            height: frame.height,
            duration_ms: frame.duration_ms,
            blend,
            dispose,
            payload: frame.bitstream,
            alpha: frame.alpha_data,
            lossless: !frame.is_lossy,
        })
    }
}

/// Every top-level chunk must end inside `file`; a missing final pad byte is tolerated.
///
/// The demuxer slices chunk ranges as declared, so this runs first.
fn check_chunk_extents(file: &[u8]) -> ExtractResult<()> {
    let mut pos = RIFF_HEADER_LEN;
    while pos < file.len() {
        let Some(header) = file.get(pos..pos + CHUNK_HEADER_LEN) else {
            return Err(ExtractError::invalid_source(format!(
                "truncated chunk header at offset {pos}"
            )));
        };
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
        let payload_end = pos + CHUNK_HEADER_LEN + size;
        if payload_end > file.len() {
            return Err(ExtractError::invalid_source(format!(
                "chunk '{}' at offset {pos} declares {size} bytes, {} available",
                String::from_utf8_lossy(&header[0..4]),
                file.len() - pos - CHUNK_HEADER_LEN
            )));
        }
        pos = payload_end + (size & 1);
    }
    Ok(())
}
