//! Frame sinks.
//!
//! Sinks consume composited canvas snapshots in fragment order.

/// Sink writing one raster file per frame.
pub mod image_dir;
/// Generic frame sink trait and the in-memory sink.
pub mod sink;
