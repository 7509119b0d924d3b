//! Config Document Core
//!
//! Document model, editing operations and the serializer.

pub mod document;
pub mod editor;
pub mod render;

pub use document::{BlockLine, ConfigOption, Document, Item, MultiLineOption, Section};
pub use editor::OptionValue;
pub use render::render;
