pub mod catalog;
pub mod notifier;

pub use catalog::*;
pub use notifier::*;
