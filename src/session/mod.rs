//! Extraction sessions.
//!
//! A session owns one canvas for the duration of a run and feeds every composited snapshot to a
//! [`FrameSink`](crate::encode::sink::FrameSink).

/// Fragment loop, skip bookkeeping and the `decode_animation` entry point.
pub mod extract;
