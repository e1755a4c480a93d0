// d2render Infrastructure - System Adapters
// Implements: DiagramRenderer

pub mod subprocess_renderer;

pub use subprocess_renderer::{OutputMode, RendererConfig, SubprocessRenderer};
