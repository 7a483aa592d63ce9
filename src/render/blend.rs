use crate::foundation::core::{BlendMode, CanvasSize, DrawRect};
use crate::foundation::error::{ExtractError, ExtractResult};

/// One straight (non-premultiplied) RGBA8 pixel.
pub type Rgba8 = [u8; 4];

const TRANSPARENT: Rgba8 = [0, 0, 0, 0];

/// Straight-alpha source-over: `src` placed on top of `dst`.
///
/// Opaque sources replace the destination outright and fully transparent sources leave a
/// visible destination untouched; everything else goes through [`source_over_straight`], so
/// transparent over transparent is transparent black.
pub fn source_over(dst: Rgba8, src: Rgba8) -> Rgba8 {
    match src[3] {
        255 => src,
        0 if dst[3] != 0 => dst,
        _ => source_over_straight(dst, src),
    }
}

/// The general source-over formula, evaluated in `0..=1` float space and rounded back to 8 bits.
pub fn source_over_straight(dst: Rgba8, src: Rgba8) -> Rgba8 {
    let sa = f32::from(src[3]) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let dst_weight = da * (1.0 - sa);
    let out_a = sa + dst_weight;

    if out_a <= 0.0 {
        return TRANSPARENT;
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (f32::from(src[i]) * sa + f32::from(dst[i]) * dst_weight) / out_a;
        out[i] = to_u8(c);
    }
    out[3] = to_u8(out_a * 255.0);
    out
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Clear `rect` on a `canvas`-sized RGBA8 buffer to transparent black.
pub fn clear_rect(buf: &mut [u8], canvas: CanvasSize, rect: DrawRect) -> ExtractResult<()> {
    check_canvas_len(buf, canvas)?;
    if rect.is_empty() {
        return Ok(());
    }
    let rect = DrawRect::clipped(rect.x, rect.y, rect.width, rect.height, canvas);
    for y in rect.y..rect.y + rect.height {
        let row = row_span(canvas, rect, y);
        buf[row].fill(0);
    }
    Ok(())
}

/// Draw the top-left `rect.width x rect.height` corner of `src` onto `rect` of the canvas.
///
/// `src` is a tightly packed RGBA8 buffer `src_width` pixels wide. `NoBlend` copies source
/// pixels verbatim; `Blend` composites with [`source_over`].
pub fn draw_rect(
    buf: &mut [u8],
    canvas: CanvasSize,
    rect: DrawRect,
    src: &[u8],
    src_width: u32,
    mode: BlendMode,
) -> ExtractResult<()> {
    check_canvas_len(buf, canvas)?;
    if rect.is_empty() {
        return Ok(());
    }
    if rect.width > src_width
        || u64::from(rect.x) + u64::from(rect.width) > u64::from(canvas.width)
        || u64::from(rect.y) + u64::from(rect.height) > u64::from(canvas.height)
    {
        return Err(ExtractError::validation(
            "draw_rect expects a rectangle clipped to both canvas and source",
        ));
    }
    let src_stride = src_width as usize * 4;
    if src.len() < src_stride * rect.height as usize {
        return Err(ExtractError::validation(
            "draw_rect source buffer is shorter than the draw rectangle",
        ));
    }

    let row_bytes = rect.width as usize * 4;
    for row in 0..rect.height {
        let s0 = row as usize * src_stride;
        let src_row = &src[s0..s0 + row_bytes];
        let dst_row = &mut buf[row_span(canvas, rect, rect.y + row)];

        match mode {
            BlendMode::NoBlend => dst_row.copy_from_slice(src_row),
            BlendMode::Blend => {
                for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                    let out = source_over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
                    d.copy_from_slice(&out);
                }
            }
        }
    }
    Ok(())
}

fn row_span(canvas: CanvasSize, rect: DrawRect, y: u32) -> std::ops::Range<usize> {
    let start = (y as usize * canvas.width as usize + rect.x as usize) * 4;
    start..start + rect.width as usize * 4
}

fn check_canvas_len(buf: &[u8], canvas: CanvasSize) -> ExtractResult<()> {
    if buf.len() != canvas.rgba_len()? {
        return Err(ExtractError::validation(
            "canvas buffer does not match canvas width*height*4",
        ));
    }
    Ok(())
}
