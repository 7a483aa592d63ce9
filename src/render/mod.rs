//! Canvas compositing.

/// Straight-alpha pixel math and rectangle helpers.
pub mod blend;
/// The dispose-then-draw canvas state machine.
pub mod compositor;
