use crate::container::Fragment;
use crate::foundation::core::{BlendMode, CanvasSize, DisposeMode, DrawRect, FragmentIndex};
use crate::foundation::error::{ExtractError, ExtractResult};
use crate::render::blend;

/// A full-canvas RGBA8 snapshot.
///
/// Pixels are **straight** (non-premultiplied) alpha, tightly packed, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanvasFrame {
    /// Frame width in pixels (always the canvas width).
    pub width: u32,
    /// Frame height in pixels (always the canvas height).
    pub height: u32,
    /// RGBA8 bytes.
    pub data: Vec<u8>,
}

/// What the previous drawn fragment left behind for the next step to undo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriorFrame {
    /// Fragment that was drawn.
    pub index: FragmentIndex,
    /// Canvas rectangle that was actually drawn (after clipping).
    pub rect: DrawRect,
    /// Dispose instruction carried by that fragment.
    pub dispose: DisposeMode,
}

/// Persistent canvas that applies dispose-then-draw for each fragment in order.
///
/// Usage per fragment: [`Compositor::dispose_prior`], then [`Compositor::draw`] with the
/// decoded pixels, then [`Compositor::snapshot`]. A fragment that fails between the two
/// calls simply never reaches `draw`, so the prior-frame record is not advanced.
#[derive(Clone, Debug)]
pub struct Compositor {
    canvas: CanvasSize,
    buf: Vec<u8>,
    prior: Option<PriorFrame>,
}

impl Compositor {
    /// Allocate a fully transparent canvas.
    pub fn new(canvas: CanvasSize) -> ExtractResult<Self> {
        let len = canvas.rgba_len()?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(len).map_err(|e| {
            ExtractError::validation(format!(
                "cannot allocate {}x{} canvas: {e}",
                canvas.width, canvas.height
            ))
        })?;
        buf.resize(len, 0);
        Ok(Self {
            canvas,
            buf,
            prior: None,
        })
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// Current canvas contents.
    pub fn pixels(&self) -> &[u8] {
        &self.buf
    }

    /// Record of the last drawn fragment, `None` before the first draw.
    pub fn prior(&self) -> Option<PriorFrame> {
        self.prior
    }

    /// Dispose phase: clear the previous fragment's drawn rectangle if it asked for it.
    ///
    /// Idempotent until the next [`Compositor::draw`].
    pub fn dispose_prior(&mut self) -> ExtractResult<()> {
        match self.prior {
            Some(PriorFrame {
                rect,
                dispose: DisposeMode::Background,
                ..
            }) => blend::clear_rect(&mut self.buf, self.canvas, rect),
            _ => Ok(()),
        }
    }

    /// Draw phase: clip, pre-clear for `NoBlend`, composite `pixels`, and advance the
    /// prior-frame record.
    ///
    /// `pixels` must be the fragment's decoded RGBA8, `width * height * 4` bytes. Returns the
    /// clipped rectangle, which may be empty when the fragment lies off-canvas.
    pub fn draw(&mut self, fragment: &Fragment<'_>, pixels: &[u8]) -> ExtractResult<DrawRect> {
        if fragment.width == 0 || fragment.height == 0 {
            return Err(ExtractError::validation(format!(
                "fragment {} has zero size",
                fragment.index
            )));
        }
        if fragment.rgba_len() != Some(pixels.len()) {
            return Err(ExtractError::validation(format!(
                "fragment {} pixel buffer is {} bytes, expected {}x{}x4",
                fragment.index,
                pixels.len(),
                fragment.width,
                fragment.height
            )));
        }

        let rect = DrawRect::clipped(
            fragment.x_offset,
            fragment.y_offset,
            fragment.width,
            fragment.height,
            self.canvas,
        );

        if fragment.blend == BlendMode::NoBlend {
            blend::clear_rect(&mut self.buf, self.canvas, rect)?;
        }
        blend::draw_rect(
            &mut self.buf,
            self.canvas,
            rect,
            pixels,
            fragment.width,
            fragment.blend,
        )?;

        self.prior = Some(PriorFrame {
            index: fragment.index,
            rect,
            dispose: fragment.dispose,
        });
        Ok(rect)
    }

    /// Copy of the whole canvas.
    pub fn snapshot(&self) -> CanvasFrame {
        CanvasFrame {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.buf.clone(),
        }
    }

    /// Run one full step (dispose, draw, snapshot) for an already decoded fragment.
    pub fn step(&mut self, fragment: &Fragment<'_>, pixels: &[u8]) -> ExtractResult<CanvasFrame> {
        self.dispose_prior()?;
        self.draw(fragment, pixels)?;
        Ok(self.snapshot())
    }
}
