pub mod info;
pub mod nav;
pub mod outline;
pub mod progress;
