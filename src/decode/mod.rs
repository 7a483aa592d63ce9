//! Single-fragment pixel decoding.

/// WebP bitstream decoding through the `image` crate.
pub mod webp;

use crate::container::Fragment;
use crate::foundation::error::ExtractResult;

/// Turns one fragment's compressed payload into pixels.
///
/// Implementations return a tightly packed, top-left-origin, straight-alpha RGBA8 buffer of
/// exactly `fragment.width * fragment.height * 4` bytes.
pub trait FragmentDecoder {
    fn decode(&self, fragment: &Fragment<'_>) -> ExtractResult<Vec<u8>>;
}
