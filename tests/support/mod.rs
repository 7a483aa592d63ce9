#![allow(dead_code)]

use std::io::Cursor;

use webp_frames::{BlendMode, DisposeMode};
use zenwebp::decoder::LoopCount;
use zenwebp::mux::{BlendMethod, DisposeMethod, MuxFrame, WebPMux};

/// Lossless `VP8L` bitstream (no chunk header) holding `w`x`h` pixels of `rgba`.
pub fn vp8l_bitstream(rgba: &[u8], w: u32, h: u32) -> Vec<u8> {
    let mut file = Vec::new();
    image::codecs::webp::WebPEncoder::new_lossless(Cursor::new(&mut file))
        .encode(rgba, w, h, image::ExtendedColorType::Rgba8)
        .unwrap();
    assert_eq!(&file[12..16], b"VP8L");
    let len = u32::from_le_bytes([file[16], file[17], file[18], file[19]]) as usize;
    file[20..20 + len].to_vec()
}

pub fn solid(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    vp8l_bitstream(&px.repeat((w * h) as usize), w, h)
}

pub struct TestFrame {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub duration_ms: u32,
    pub blend: BlendMode,
    pub dispose: DisposeMode,
    pub payload: Vec<u8>,
    pub unreadable: bool,
}

impl TestFrame {
    pub fn solid(x: u32, y: u32, w: u32, h: u32, px: [u8; 4]) -> Self {
        Self {
            x,
            y,
            w,
            h,
            duration_ms: 100,
            blend: BlendMode::Blend,
            dispose: DisposeMode::None,
            payload: solid(w, h, px),
            unreadable: false,
        }
    }

    pub fn duration(mut self, ms: u32) -> Self {
        self.duration_ms = ms;
        self
    }

    pub fn no_blend(mut self) -> Self {
        self.blend = BlendMode::NoBlend;
        self
    }

    pub fn dispose_background(mut self) -> Self {
        self.dispose = DisposeMode::Background;
        self
    }

    /// Hide the frame's bitstream behind an unknown chunk tag.
    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }

    fn mux_frame(&self) -> MuxFrame {
        MuxFrame {
            x_offset: self.x,
            y_offset: self.y,
            width: self.w,
            height: self.h,
            duration_ms: self.duration_ms,
            dispose: match self.dispose {
                DisposeMode::None => DisposeMethod::None,
                DisposeMode::Background => DisposeMethod::Background,
            },
            blend: match self.blend {
                BlendMode::Blend => BlendMethod::AlphaBlend,
                BlendMode::NoBlend => BlendMethod::Overwrite,
            },
            bitstream: self.payload.clone(),
            alpha_data: None,
            is_lossless: true,
        }
    }
}

/// Animated WebP with a `width`x`height` canvas and the given frames.
///
/// Frames may hang over the canvas edge. The muxer only accepts frames inside its canvas, so
/// the file is muxed on a covering canvas and the declared `VP8X` size is rewritten after.
pub fn animation(width: u32, height: u32, frames: &[TestFrame]) -> Vec<u8> {
    let mux_w = frames.iter().map(|f| f.x + f.w).fold(width, u32::max);
    let mux_h = frames.iter().map(|f| f.y + f.h).fold(height, u32::max);

    let mut mux = WebPMux::new(mux_w, mux_h);
    mux.set_animation([0; 4], LoopCount::Forever);
    for f in frames {
        mux.push_frame(f.mux_frame()).unwrap();
    }
    let mut file = mux.assemble().unwrap();
    set_canvas(&mut file, width, height);

    let anmfs = chunk_offsets(&file, b"ANMF");
    for (f, at) in frames.iter().zip(anmfs) {
        if f.unreadable {
            // sub-chunk tag follows the 8-byte ANMF header and 16-byte frame header
            file[at + 24..at + 28].copy_from_slice(b"JUNK");
        }
    }
    file
}

/// Animated WebP that declares a canvas but carries no `ANMF` chunks.
pub fn empty_animation(width: u32, height: u32) -> Vec<u8> {
    let file = animation(width, height, &[TestFrame::solid(0, 0, 1, 1, [0; 4])]);
    let first_anmf = chunk_offsets(&file, b"ANMF")[0];
    let mut file = file[..first_anmf].to_vec();
    let riff_size = file.len() as u32 - 8;
    file[4..8].copy_from_slice(&riff_size.to_le_bytes());
    file
}

/// Still (non-animated) lossless WebP.
pub fn still(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let mut mux = WebPMux::new(w, h);
    mux.set_image(TestFrame::solid(0, 0, w, h, px).mux_frame());
    mux.assemble().unwrap()
}

/// Animated WebP declaring the largest canvas `VP8X` can express, with one 1x1 frame.
pub fn maximal_canvas() -> Vec<u8> {
    let mut file = animation(2, 2, &[TestFrame::solid(0, 0, 1, 1, [0; 4])]);
    file[24..30].copy_from_slice(&[0xff; 6]);
    file
}

fn set_canvas(file: &mut [u8], width: u32, height: u32) {
    assert_eq!(&file[12..16], b"VP8X");
    file[24..27].copy_from_slice(&(width - 1).to_le_bytes()[..3]);
    file[27..30].copy_from_slice(&(height - 1).to_le_bytes()[..3]);
}

/// Offsets of top-level chunks tagged `fourcc`.
fn chunk_offsets(file: &[u8], fourcc: &[u8; 4]) -> Vec<usize> {
    let mut out = Vec::new();
    let mut pos = 12;
    while pos + 8 <= file.len() {
        let size = u32::from_le_bytes([file[pos + 4], file[pos + 5], file[pos + 6], file[pos + 7]])
            as usize;
        if &file[pos..pos + 4] == fourcc {
            out.push(pos);
        }
        pos += 8 + size + (size & 1);
    }
    out
}

pub fn pixel(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [data[i], data[i + 1], data[i + 2], data[i + 3]]
}

pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::path::PathBuf::from("target").join("webp_frames_tests").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
