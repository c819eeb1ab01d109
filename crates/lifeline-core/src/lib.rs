//! # Lifeline Core
//!
//! Reactive component runtime for the lifeline framework.
//!
//! ## Components
//!
//! - [`LockSet`] - Shared/exclusive lock with condition and barrier primitives
//! - [`ChannelBase`] - A named, bounded, typed queue
//! - [`ChannelRegistry`] - Named sub-channels plus one main channel
//! - [`ValidatedCell`] / [`Property`] - Validated value cells with change notification
//! - [`Lifecycle`] - State machine orchestrating the sub-managers
//! - [`ComponentSet`] - Process, stage, event and signal managers

pub mod channel;
pub mod codec;
pub mod components;
pub mod lifecycle;
pub mod process;
pub mod property;
pub mod registry;
pub mod sync;

pub use channel::{ChannelBase, LARGE_BUFFER, MEDIUM_BUFFER, SMALL_BUFFER};
pub use components::{
    Component, ComponentSet, EventTable, OsSignalManager, ProcessTable, StageTable,
};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use process::ControlledProcess;
pub use property::{Property, PostSetCallback, Telemetry, ValidatedCell};
pub use registry::{BaseRegistry, BufferSizes, ChannelKind, ChannelRegistry, SubChannel};
pub use sync::LockSet;
