//! Registries: the keyed store behind the sub-managers and the channel
//! registry behind every reactive component.

mod base;
mod channels;

pub use base::BaseRegistry;
pub use channels::{
    control_message, BufferSizes, ChannelKind, ChannelRegistry, SubChannel, CONDITION, CTL,
    DONE, MONITOR, TELEMETRY,
};
