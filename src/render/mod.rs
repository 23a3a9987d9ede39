//! Rendering Module
//!
//! - Renderer: splits and wraps text nodes to realize a range
//! - Decorator: visual state applied to wrappers (pluggable)
//!
//! Every wrapper carries the configured marker attribute (value: the
//! highlight id) so tree consumers can recognize and skip synthetic
//! elements.

pub mod decorator;
pub mod renderer;

pub use decorator::{ClassDecorator, Decorator};
pub use renderer::Renderer;
