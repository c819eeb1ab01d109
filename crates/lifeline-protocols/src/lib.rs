//! # Lifeline Protocols
//!
//! Protocol definitions (traits) for the lifeline component runtime.
//! Contains only interface definitions and shared value types - no implementations.
//!
//! ## Core Traits
//!
//! - [`Validator`] - Pluggable predicate gating writes to a validated cell
//! - [`ProcessInput`] - Command carrier driven by the lifecycle orchestrator
//! - [`ProcessManager`], [`StageManager`], [`EventManager`], [`SignalManager`] -
//!   Keyed bookkeeping collaborators composed into a lifecycle

pub mod error;
pub mod format;
pub mod manager;
pub mod process;
pub mod reference;
pub mod validation;

pub use error::{
    ChannelError, FormatError, LifecycleError, ManagerError, PropertyError,
};
pub use format::Format;
pub use manager::{
    Event, EventHandler, EventManager, ProcessManager, SignalManager, Stage, StageManager,
};
pub use process::{ProcessConfig, ProcessInput, SendCallback};
pub use reference::Reference;
pub use validation::{FnValidator, ValidationResult, Validator};
