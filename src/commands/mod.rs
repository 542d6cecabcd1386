pub mod check;
pub mod serve;
pub mod targets;

// Re-export command functions for convenience
pub use check::check;
pub use serve::serve;
pub use targets::{add_target, list_targets, remove_target};
