pub mod document;
pub mod geometry;
pub mod layout;
pub mod outline;
pub mod text;

pub use document::{Document, NodeId};
pub use layout::LayoutOptions;
