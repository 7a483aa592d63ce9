use std::path::{Path, PathBuf};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{ExtractError, ExtractResult};
use crate::render::compositor::CanvasFrame;

/// Raster format used for each written frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Bmp,
    Tiff,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Tiff => image::ImageFormat::Tiff,
        }
    }
}

/// Options for [`ImageDirSink`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageDirSinkOpts {
    /// Directory receiving the frames.
    pub out_dir: PathBuf,
    /// File name prefix; the zero-padded ordinal and extension follow.
    pub prefix: String,
    pub format: OutputFormat,
    /// Create `out_dir` (and parents) in `begin` when missing.
    pub create_dirs: bool,
    /// Replace existing files instead of failing the write.
    pub overwrite: bool,
}

impl Default for ImageDirSinkOpts {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("frames"),
            prefix: "frame_".to_string(),
            format: OutputFormat::Png,
            create_dirs: true,
            overwrite: true,
        }
    }
}

impl ImageDirSinkOpts {
    /// Default options writing PNGs into `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            ..Self::default()
        }
    }

    /// Path of the frame with zero-based `ordinal`, e.g. `frames/frame_00000003.png`.
    pub fn frame_path(&self, ordinal: u32) -> PathBuf {
        self.out_dir.join(format!(
            "{}{ordinal:08}.{}",
            self.prefix,
            self.format.extension()
        ))
    }
}

/// Sink writing one image file per frame.
#[derive(Debug)]
pub struct ImageDirSink {
    opts: ImageDirSinkOpts,
    cfg: Option<SinkConfig>,
}

impl ImageDirSink {
    pub fn new(opts: ImageDirSinkOpts) -> Self {
        Self { opts, cfg: None }
    }

    pub fn opts(&self) -> &ImageDirSinkOpts {
        &self.opts
    }
}

impl FrameSink for ImageDirSink {
    fn begin(&mut self, cfg: SinkConfig) -> ExtractResult<()> {
        ensure_dir(&self.opts.out_dir, self.opts.create_dirs)?;
        self.cfg = Some(cfg);
        Ok(())
    }

    fn write(&mut self, ordinal: u32, frame: &CanvasFrame) -> ExtractResult<Option<PathBuf>> {
        if let Some(cfg) = self.cfg
            && (cfg.canvas.width, cfg.canvas.height) != (frame.width, frame.height)
        {
            return Err(ExtractError::validation(format!(
                "frame is {}x{}, sink was configured for {}x{}",
                frame.width, frame.height, cfg.canvas.width, cfg.canvas.height
            )));
        }

        let path = self.opts.frame_path(ordinal);
        if !self.opts.overwrite && path.exists() {
            return Err(ExtractError::validation(format!(
                "output file '{}' already exists",
                path.display()
            )));
        }

        image::save_buffer_with_format(
            &path,
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            self.opts.format.image_format(),
        )?;
        tracing::debug!(path = %path.display(), "wrote frame");
        Ok(Some(path))
    }

    fn end(&mut self) -> ExtractResult<()> {
        Ok(())
    }
}

fn ensure_dir(dir: &Path, create: bool) -> ExtractResult<()> {
    if dir.is_dir() {
        return Ok(());
    }
    if !create {
        return Err(ExtractError::validation(format!(
            "output directory '{}' does not exist",
            dir.display()
        )));
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}
