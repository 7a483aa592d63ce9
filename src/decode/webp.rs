use anyhow::Context as _;
use zenwebp::mux::{BlendMethod, DisposeMethod, MuxError, MuxFrame, WebPMux};

use crate::container::Fragment;
use crate::decode::FragmentDecoder;
use crate::foundation::error::{ExtractError, ExtractResult, SkipKind};

/// Decodes `VP8 ` / `VP8L` fragment bitstreams with `image`'s WebP codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebpFragmentDecoder;

impl FragmentDecoder for WebpFragmentDecoder {
    fn decode(&self, fragment: &Fragment<'_>) -> ExtractResult<Vec<u8>> {
        let file = standalone_webp(fragment)?;
        let img = image::load_from_memory_with_format(&file, image::ImageFormat::WebP)
            .with_context(|| format!("decode fragment {}", fragment.index))?;
        let rgba = img.to_rgba8();

        let (w, h) = rgba.dimensions();
        if (w, h) != (fragment.width, fragment.height) {
            return Err(ExtractError::fragment(
                fragment.index,
                SkipKind::FragmentDecode,
                format!(
                    "decoded {w}x{h}, fragment declares {}x{}",
                    fragment.width, fragment.height
                ),
            ));
        }
        Ok(rgba.into_raw())
    }
}

/// Re-mux a fragment bitstream as a self-contained still WebP file.
///
/// `VP8L` carries its own alpha and goes out as a simple file; `VP8 ` with alpha data gets
/// an extended header advertising alpha.
fn standalone_webp(fragment: &Fragment<'_>) -> ExtractResult<Vec<u8>> {
    if fragment.width == 0 || fragment.height == 0 {
        return Err(ExtractError::fragment(
            fragment.index,
            SkipKind::FragmentDimension,
            "fragment has zero size",
        ));
    }
    let alpha_data = fragment
        .alpha
        .filter(|_| !fragment.lossless)
        .map(<[u8]>::to_vec);

    let mut mux = WebPMux::new(fragment.width, fragment.height);
    mux.set_image(MuxFrame {
        x_offset: 0,
        y_offset: 0,
        width: fragment.width,
        height: fragment.height,
        duration_ms: 0,
        dispose: DisposeMethod::None,
        blend: BlendMethod::AlphaBlend,
        bitstream: fragment.payload.to_vec(),
        alpha_data,
        is_lossless: fragment.lossless,
    });
    mux.assemble().map_err(|e| {
        ExtractError::fragment(
            fragment.index,
            SkipKind::FragmentDecode,
            MuxError::from(e).to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::foundation::core::{BlendMode, DisposeMode, FragmentIndex};

    /// Encode `rgba` losslessly and return the raw `VP8L` bitstream.
    fn vp8l_bitstream(rgba: &[u8], w: u32, h: u32) -> Vec<u8> {
        let mut file = Vec::new();
        image::codecs::webp::WebPEncoder::new_lossless(Cursor::new(&mut file))
            .encode(rgba, w, h, image::ExtendedColorType::Rgba8)
            .unwrap();
        assert_eq!(&file[12..16], b"VP8L");
        let len = u32::from_le_bytes([file[16], file[17], file[18], file[19]]) as usize;
        file[20..20 + len].to_vec()
    }

    fn frag(payload: &[u8], w: u32, h: u32) -> Fragment<'_> {
        Fragment {
            index: FragmentIndex(4),
            x_offset: 0,
            y_offset: 0,
            width: w,
            height: h,
            duration_ms: 0,
            blend: BlendMode::Blend,
            dispose: DisposeMode::None,
            payload,
            alpha: None,
            lossless: true,
        }
    }

    #[test]
    fn decodes_lossless_payload_exactly() {
        let rgba: Vec<u8> = [
            [255, 0, 0, 255],
            [0, 255, 0, 128],
            [0, 0, 255, 255],
            [0, 0, 0, 0],
            [10, 20, 30, 40],
            [200, 100, 50, 255],
        ]
        .concat();
        let payload = vp8l_bitstream(&rgba, 3, 2);

        let out = WebpFragmentDecoder.decode(&frag(&payload, 3, 2)).unwrap();
        assert_eq!(out, rgba);
    }

    #[test]
    fn opaque_payload_decodes_with_full_alpha() {
        let rgba = [9u8, 8, 7, 255].repeat(4);
        let payload = vp8l_bitstream(&rgba, 2, 2);
        let out = WebpFragmentDecoder.decode(&frag(&payload, 2, 2)).unwrap();
        assert_eq!(out, rgba);
    }

    #[test]
    fn size_mismatch_is_a_decode_error() {
        let rgba = [1u8, 2, 3, 255].repeat(4);
        let payload = vp8l_bitstream(&rgba, 2, 2);
        match WebpFragmentDecoder.decode(&frag(&payload, 3, 2)) {
            Err(ExtractError::Fragment { index, kind, .. }) => {
                assert_eq!(index, FragmentIndex(4));
                assert_eq!(kind, SkipKind::FragmentDecode);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_signature_fails() {
        assert!(WebpFragmentDecoder.decode(&frag(&[0x00, 0x01], 1, 1)).is_err());
    }

    #[test]
    fn empty_bitstream_fails() {
        assert!(WebpFragmentDecoder.decode(&frag(&[], 1, 1)).is_err());
    }

    #[test]
    fn zero_size_is_a_dimension_error() {
        match standalone_webp(&frag(&[0x2f], 0, 3)) {
            Err(ExtractError::Fragment { kind, .. }) => {
                assert_eq!(kind, SkipKind::FragmentDimension)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn alpha_data_switches_to_extended_header() {
        let vp8 = [0u8; 10];
        let mut f = frag(&vp8, 3, 5);
        f.lossless = false;
        f.alpha = Some(&[0, 0]);
        let file = standalone_webp(&f).unwrap();
        assert_eq!(&file[12..16], b"VP8X");
        assert_eq!(file[20] & 0x10, 0x10);
        assert_eq!(&file[24..27], &[2, 0, 0]);
        assert_eq!(&file[27..30], &[4, 0, 0]);
        assert_eq!(&file[30..34], b"ALPH");
    }

    #[test]
    fn lossless_payload_stays_simple() {
        let bitstream = [0x2f, 0, 0, 0, 0];
        let mut f = frag(&bitstream, 1, 1);
        f.alpha = Some(&[0, 0]);
        let file = standalone_webp(&f).unwrap();
        assert_eq!(&file[12..16], b"VP8L");
        assert_eq!(&file[20..25], &bitstream);
    }
}
