//! Error types for the lifeline protocol layer.

mod channel;
mod format;
mod lifecycle;
mod manager;
mod property;

pub use channel::*;
pub use format::*;
pub use lifecycle::*;
pub use manager::*;
pub use property::*;
