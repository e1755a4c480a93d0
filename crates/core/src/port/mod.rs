// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod renderer;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use renderer::{DiagramRenderer, RenderError, RenderOutput};
pub use time_provider::TimeProvider;
