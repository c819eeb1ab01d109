//! Channel registry.
//!
//! A [`ChannelRegistry`] is a named collection of sub-channels plus one
//! distinguished main channel. Sub-channels carry one of a small closed set
//! of element kinds (see [`SubChannel`]). The map is populated lazily with
//! the default control channels on first access.
//!
//! The registry lock guards only the map. Traffic on a channel handle that
//! was already looked up does not touch it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use lifeline_protocols::{ChannelError, Reference};

use crate::channel::{ChannelBase, LARGE_BUFFER, MEDIUM_BUFFER, SMALL_BUFFER};
use crate::property::Property;
use crate::sync::LockSet;

pub const DONE: &str = "done";
pub const CTL: &str = "ctl";
pub const CONDITION: &str = "condition";
pub const TELEMETRY: &str = "telemetry";
pub const MONITOR: &str = "monitor";

/// Main channel capacity used by [`ChannelRegistry::new_with_property`] when no
/// size is given.
const DEFAULT_PROPERTY_BUFFER: usize = 3;

/// Element kind carried by a sub-channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Flag,
    Text,
    Message,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Flag => write!(f, "flag"),
            ChannelKind::Text => write!(f, "text"),
            ChannelKind::Message => write!(f, "message"),
        }
    }
}

/// A sub-channel of one of the supported element kinds.
pub enum SubChannel<T> {
    Flag(Arc<ChannelBase<bool>>),
    Text(Arc<ChannelBase<String>>),
    Message(Arc<ChannelBase<T>>),
}

impl<T> SubChannel<T> {
    pub fn flag(name: &str, capacity: usize) -> Self {
        SubChannel::Flag(Arc::new(ChannelBase::new(name, capacity)))
    }

    pub fn text(name: &str, capacity: usize) -> Self {
        SubChannel::Text(Arc::new(ChannelBase::new(name, capacity)))
    }

    pub fn message(name: &str, capacity: usize) -> Self {
        SubChannel::Message(Arc::new(ChannelBase::new(name, capacity)))
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            SubChannel::Flag(_) => ChannelKind::Flag,
            SubChannel::Text(_) => ChannelKind::Text,
            SubChannel::Message(_) => ChannelKind::Message,
        }
    }

    pub fn name(&self) -> String {
        match self {
            SubChannel::Flag(ch) => ch.name(),
            SubChannel::Text(ch) => ch.name(),
            SubChannel::Message(ch) => ch.name(),
        }
    }

    pub fn capacity(&self) -> usize {
        match self {
            SubChannel::Flag(ch) => ch.capacity(),
            SubChannel::Text(ch) => ch.capacity(),
            SubChannel::Message(ch) => ch.capacity(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SubChannel::Flag(ch) => ch.len(),
            SubChannel::Text(ch) => ch.len(),
            SubChannel::Message(ch) => ch.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        match self {
            SubChannel::Flag(ch) => ch.is_closed(),
            SubChannel::Text(ch) => ch.is_closed(),
            SubChannel::Message(ch) => ch.is_closed(),
        }
    }

    pub fn set_buffers(&self, capacity: usize) -> usize {
        match self {
            SubChannel::Flag(ch) => ch.set_buffers(capacity),
            SubChannel::Text(ch) => ch.set_buffers(capacity),
            SubChannel::Message(ch) => ch.set_buffers(capacity),
        }
    }

    pub fn clear(&self) -> Result<(), ChannelError> {
        match self {
            SubChannel::Flag(ch) => ch.clear(),
            SubChannel::Text(ch) => ch.clear(),
            SubChannel::Message(ch) => ch.clear(),
        }
    }

    pub fn close(&self) -> Result<(), ChannelError> {
        match self {
            SubChannel::Flag(ch) => ch.close(),
            SubChannel::Text(ch) => ch.close(),
            SubChannel::Message(ch) => ch.close(),
        }
    }

    /// True when both handles point at the same underlying channel.
    pub fn same_channel(&self, other: &SubChannel<T>) -> bool {
        match (self, other) {
            (SubChannel::Flag(a), SubChannel::Flag(b)) => Arc::ptr_eq(a, b),
            (SubChannel::Text(a), SubChannel::Text(b)) => Arc::ptr_eq(a, b),
            (SubChannel::Message(a), SubChannel::Message(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T> Clone for SubChannel<T> {
    fn clone(&self) -> Self {
        match self {
            SubChannel::Flag(ch) => SubChannel::Flag(ch.clone()),
            SubChannel::Text(ch) => SubChannel::Text(ch.clone()),
            SubChannel::Message(ch) => SubChannel::Message(ch.clone()),
        }
    }
}

impl<T> fmt::Debug for SubChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubChannel")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Capacities used for the default sub-channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSizes {
    pub small: usize,
    pub medium: usize,
    pub large: usize,
}

impl Default for BufferSizes {
    fn default() -> Self {
        Self {
            small: SMALL_BUFFER,
            medium: MEDIUM_BUFFER,
            large: LARGE_BUFFER,
        }
    }
}

/// Format a control-plane message.
pub fn control_message(context: &str, message: &str) -> String {
    serde_json::json!({ "context": context, "message": message }).to_string()
}

struct RegistryState<T> {
    name: String,
    channels: Option<HashMap<String, SubChannel<T>>>,
    main: Arc<ChannelBase<T>>,
    with_metrics: bool,
    buffer_size: usize,
    sizes: BufferSizes,
    property: Option<Arc<Property<T>>>,
}

impl<T> RegistryState<T> {
    fn channels(&mut self) -> &mut HashMap<String, SubChannel<T>> {
        let sizes = self.sizes;
        let with_metrics = self.with_metrics;
        self.channels
            .get_or_insert_with(|| default_channels(sizes, with_metrics))
    }
}

fn default_channels<T>(sizes: BufferSizes, with_metrics: bool) -> HashMap<String, SubChannel<T>> {
    let mut channels = HashMap::new();
    channels.insert(DONE.to_string(), SubChannel::flag(DONE, sizes.small));
    channels.insert(CTL.to_string(), SubChannel::text(CTL, sizes.medium));
    channels.insert(CONDITION.to_string(), SubChannel::text(CONDITION, sizes.small));
    if with_metrics {
        add_metric_channels(&mut channels, sizes);
    }
    channels
}

fn add_metric_channels<T>(channels: &mut HashMap<String, SubChannel<T>>, sizes: BufferSizes) {
    for name in [TELEMETRY, MONITOR] {
        channels
            .entry(name.to_string())
            .or_insert_with(|| SubChannel::text(name, sizes.medium));
    }
}

/// Named collection of sub-channels plus one main channel.
pub struct ChannelRegistry<T> {
    reference: Reference,
    state: LockSet<RegistryState<T>>,
}

impl<T> ChannelRegistry<T> {
    /// Create a registry whose sub-channel map is populated on first access.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            reference: Reference::new(name.clone()),
            state: LockSet::new(RegistryState {
                main: Arc::new(ChannelBase::new(name.clone(), LARGE_BUFFER)),
                name,
                channels: None,
                with_metrics: false,
                buffer_size: LARGE_BUFFER,
                sizes: BufferSizes::default(),
                property: None,
            }),
        }
    }

    /// Create a registry with the default sub-channels already in place.
    ///
    /// The main channel gets `buffers` slots (3 when `None`).
    pub fn new_with_property(
        name: impl Into<String>,
        buffers: Option<usize>,
        property: Option<Arc<Property<T>>>,
        with_metrics: bool,
    ) -> Self {
        let name = name.into();
        let buffer_size = buffers.unwrap_or(DEFAULT_PROPERTY_BUFFER);
        let sizes = BufferSizes::default();
        Self {
            reference: Reference::new(name.clone()),
            state: LockSet::new(RegistryState {
                main: Arc::new(ChannelBase::new(name.clone(), buffer_size)),
                name,
                channels: Some(default_channels(sizes, with_metrics)),
                with_metrics,
                buffer_size,
                sizes,
                property,
            }),
        }
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn name(&self) -> String {
        self.state.read().name.clone()
    }

    pub fn has_metrics(&self) -> bool {
        self.state.read().with_metrics
    }

    pub fn buffer_size(&self) -> usize {
        self.state.read().buffer_size
    }

    pub fn property(&self) -> Option<Arc<Property<T>>> {
        self.state.read().property.clone()
    }

    /// Enable or disable the metric channels. Enabling adds `telemetry` and
    /// `monitor` if the map is already populated; disabling removes nothing.
    pub fn with_metrics(&self, enabled: bool) -> &Self {
        let mut state = self.state.write();
        state.with_metrics = enabled;
        let sizes = state.sizes;
        if enabled {
            if let Some(channels) = state.channels.as_mut() {
                add_metric_channels(channels, sizes);
            }
        }
        self
    }

    /// Set the buffer-size hint and resize the main channel to it.
    pub fn with_buffer_size(&self, size: usize) -> &Self {
        let mut state = self.state.write();
        let applied = state.main.set_buffers(size);
        if applied > 0 {
            state.buffer_size = applied;
        }
        self
    }

    /// Capacities for default sub-channels created from now on.
    pub fn with_buffer_sizes(&self, sizes: BufferSizes) -> &Self {
        self.state.write().sizes = sizes;
        self
    }

    pub fn with_main_channel(&self, channel: Arc<ChannelBase<T>>) -> &Self {
        self.set_main_channel(channel);
        self
    }

    pub fn with_property(&self, property: Arc<Property<T>>) -> &Self {
        self.state.write().property = Some(property);
        self
    }

    /// Insert or replace a sub-channel and return the stored handle.
    ///
    /// A replaced channel is not closed.
    pub fn register_sub_channel(&self, name: &str, channel: SubChannel<T>) -> SubChannel<T> {
        let mut state = self.state.write();
        if let Some(previous) = state.channels().insert(name.to_string(), channel.clone()) {
            debug!(
                "Sub-channel {} replaced ({} -> {})",
                name,
                previous.kind(),
                channel.kind()
            );
        }
        channel
    }

    /// Look up a sub-channel and its kind. Absence is not an error.
    pub fn lookup_sub_channel(&self, name: &str) -> Option<(SubChannel<T>, ChannelKind)> {
        {
            let state = self.state.read();
            if let Some(channels) = &state.channels {
                return channels.get(name).map(|ch| (ch.clone(), ch.kind()));
            }
        }
        let mut state = self.state.write();
        state.channels().get(name).map(|ch| (ch.clone(), ch.kind()))
    }

    /// Typed lookup; `None` when absent or not a flag channel.
    pub fn lookup_flag(&self, name: &str) -> Option<Arc<ChannelBase<bool>>> {
        match self.lookup_sub_channel(name)? {
            (SubChannel::Flag(ch), _) => Some(ch),
            _ => None,
        }
    }

    /// Typed lookup; `None` when absent or not a text channel.
    pub fn lookup_text(&self, name: &str) -> Option<Arc<ChannelBase<String>>> {
        match self.lookup_sub_channel(name)? {
            (SubChannel::Text(ch), _) => Some(ch),
            _ => None,
        }
    }

    /// Typed lookup; `None` when absent or not a message channel.
    pub fn lookup_message(&self, name: &str) -> Option<Arc<ChannelBase<T>>> {
        match self.lookup_sub_channel(name)? {
            (SubChannel::Message(ch), _) => Some(ch),
            _ => None,
        }
    }

    /// Reallocate a sub-channel's queue. Returns 0 if the name is absent.
    pub fn set_sub_channel_buffers(&self, name: &str, capacity: usize) -> usize {
        match self.lookup_sub_channel(name) {
            Some((channel, _)) => channel.set_buffers(capacity),
            None => 0,
        }
    }

    /// Remove a sub-channel without closing it.
    pub fn remove_sub_channel(&self, name: &str) -> Option<SubChannel<T>> {
        self.state.write().channels().remove(name)
    }

    /// Names of all sub-channels, sorted.
    pub fn sub_channel_names(&self) -> Vec<String> {
        let mut state = self.state.write();
        let mut names: Vec<String> = state.channels().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn main_channel(&self) -> Arc<ChannelBase<T>> {
        self.state.read().main.clone()
    }

    /// Replace the main channel and return the previous one, which stays open.
    pub fn set_main_channel(&self, channel: Arc<ChannelBase<T>>) -> Arc<ChannelBase<T>> {
        let mut state = self.state.write();
        state.buffer_size = channel.capacity();
        std::mem::replace(&mut state.main, channel)
    }

    /// Close every sub-channel. The main channel stays open.
    ///
    /// Every channel is attempted; the first failure (typically
    /// [`ChannelError::AlreadyClosed`] on a second close) is returned.
    pub fn close(&self) -> Result<(), ChannelError> {
        let channels: Vec<SubChannel<T>> = {
            let mut state = self.state.write();
            state.channels().values().cloned().collect()
        };

        let mut first_error = None;
        for channel in channels {
            if let Err(e) = channel.close() {
                warn!("Failed to close sub-channel {}: {}", channel.name(), e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Enqueue `{"context": ..., "message": ...}` on the `ctl` channel
    /// without blocking.
    pub fn publish_control(&self, context: &str, message: &str) -> Result<(), ChannelError> {
        match self.lookup_sub_channel(CTL) {
            Some((SubChannel::Text(ctl), _)) => ctl.try_send(control_message(context, message)),
            Some((_, kind)) => Err(ChannelError::TypeMismatch {
                name: CTL.to_string(),
                expected: ChannelKind::Text.to_string(),
                found: kind.to_string(),
            }),
            None => Err(ChannelError::NotFound(CTL.to_string())),
        }
    }
}

impl<T> fmt::Debug for ChannelRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ChannelRegistry")
            .field("name", &state.name)
            .field("populated", &state.channels.is_some())
            .field("with_metrics", &state.with_metrics)
            .field("buffer_size", &state.buffer_size)
            .finish()
    }
}

#[cfg(test)]
#[path = "channels_tests.rs"]
mod tests;
