use crate::foundation::core::FragmentIndex;

/// Convenience result alias used across the crate.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Why a single fragment did not produce an output frame.
///
/// These never abort an extraction; they are collected into
/// [`Extraction::skipped`](crate::Extraction) and logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    /// Fragment metadata could not be retrieved from the source.
    FragmentRead,
    /// Fragment reported a non-positive width or height.
    FragmentDimension,
    /// Fragment payload failed to decode, or decoded to the wrong size.
    FragmentDecode,
    /// The composited snapshot could not be persisted by the sink.
    SinkWrite,
}

impl std::fmt::Display for SkipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::FragmentRead => "fragment read",
            Self::FragmentDimension => "fragment dimension",
            Self::FragmentDecode => "fragment decode",
            Self::SinkWrite => "sink write",
        };
        f.write_str(s)
    }
}

/// Top-level error type.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// Input bytes cannot be opened or parsed as a WebP container.
    #[error("source error: {0}")]
    Source(String),

    /// Container parsed, but declares no fragments or no usable canvas.
    #[error("empty animation: {0}")]
    EmptyAnimation(String),

    /// Invalid argument or option.
    #[error("validation error: {0}")]
    Validation(String),

    /// A per-fragment failure, as reported by a collaborator.
    #[error("{kind} error at fragment {index}: {message}")]
    Fragment {
        /// 1-based fragment ordinal.
        index: FragmentIndex,
        /// Failure category.
        kind: SkipKind,
        /// Human-readable detail.
        message: String,
    },

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Pixel codec failure from the `image` crate.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExtractError {
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    pub fn empty_animation(msg: impl Into<String>) -> Self {
        Self::EmptyAnimation(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn fragment(index: FragmentIndex, kind: SkipKind, msg: impl Into<String>) -> Self {
        Self::Fragment {
            index,
            kind,
            message: msg.into(),
        }
    }

    /// `true` for errors that terminate a whole extraction.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Fragment { .. })
    }
}
