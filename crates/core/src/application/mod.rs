// Application Layer - Use Cases

pub mod constants;
pub mod render;
mod shutdown;

// Re-exports
pub use render::RenderService;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
