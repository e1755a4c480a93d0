// Domain Layer - Pure business logic and entities

pub mod diagram;
pub mod error;
pub mod options;


// Re-exports
pub use diagram::{RenderRequest, RenderedDiagram, SVG_CONTENT_TYPE};
pub use error::DomainError;
pub use options::{OptionValue, RenderOptions, MAX_OPTION_KEY_LEN};
