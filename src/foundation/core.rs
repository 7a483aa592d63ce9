use crate::foundation::error::{ExtractError, ExtractResult};

/// 1-based fragment ordinal, as numbered by the container.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FragmentIndex(pub u32);

impl FragmentIndex {
    /// The first fragment of any animation.
    pub const FIRST: Self = Self(1);

    /// Zero-based position, used to name output files.
    pub fn ordinal0(self) -> u32 {
        self.0.saturating_sub(1)
    }
}

impl std::fmt::Display for FragmentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CanvasSize {
    /// Create a canvas size; both sides must be non-zero.
    pub fn new(width: u32, height: u32) -> ExtractResult<Self> {
        if width == 0 || height == 0 {
            return Err(ExtractError::empty_animation(format!(
                "canvas size must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels on the canvas.
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Length in bytes of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> ExtractResult<usize> {
        usize::try_from(self.pixel_count())
            .ok()
            .and_then(|px| px.checked_mul(4))
            .ok_or_else(|| ExtractError::validation("canvas buffer size overflow"))
    }
}

/// An axis-aligned pixel rectangle on the canvas, already clipped to its bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DrawRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels; may be 0.
    pub width: u32,
    /// Height in pixels; may be 0.
    pub height: u32,
}

impl DrawRect {
    /// Clip a `width x height` rectangle placed at `(x, y)` to `canvas`.
    ///
    /// A placement entirely off-canvas yields an empty rectangle that keeps its origin.
    pub fn clipped(x: u32, y: u32, width: u32, height: u32, canvas: CanvasSize) -> Self {
        Self {
            x,
            y,
            width: width.min(canvas.width.saturating_sub(x)),
            height: height.min(canvas.height.saturating_sub(y)),
        }
    }

    /// Return `true` when no pixel is covered.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Return `true` when `(px, py)` lies inside the rectangle.
    pub fn contains(self, px: u32, py: u32) -> bool {
        px >= self.x
            && py >= self.y
            && u64::from(px) < u64::from(self.x) + u64::from(self.width)
            && u64::from(py) < u64::from(self.y) + u64::from(self.height)
    }
}

/// How a fragment's pixels combine with the canvas at draw time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Straight-alpha source-over onto the existing canvas.
    #[default]
    Blend,
    /// Overwrite the covered rectangle, alpha included.
    NoBlend,
}

/// What happens to a fragment's rectangle before the next fragment is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposeMode {
    /// Leave the canvas as drawn.
    #[default]
    None,
    /// Clear the drawn rectangle to transparent black.
    Background,
}
