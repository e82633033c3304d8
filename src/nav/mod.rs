pub mod bootstrap;
pub mod entry;
pub mod progress;
pub mod session;

pub use bootstrap::{attach, PageSelectors};
pub use session::NavigationSession;
