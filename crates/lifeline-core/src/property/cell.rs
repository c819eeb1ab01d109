//! Validated, swappable value cell.
//!
//! Writes go through the optional [`Validator`]; a rejected value leaves the
//! stored one untouched and emits nothing. Accepted values are committed and
//! published on the `set` sub-channel under the same exclusive lock, so
//! notifications follow commit order.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use lifeline_protocols::{
    ChannelError, Format, FormatError, PropertyError, Reference, ValidationResult, Validator,
};

use crate::channel::{MEDIUM_BUFFER, SMALL_BUFFER};
use crate::codec;
use crate::registry::{ChannelRegistry, SubChannel};
use crate::sync::LockSet;

pub const GET: &str = "get";
pub const SET: &str = "set";
pub const CLEAR: &str = "clear";

/// A value cell gated by a validator and observed through channels.
pub struct ValidatedCell<T> {
    reference: Reference,
    value: LockSet<Arc<T>>,
    validator: Option<Arc<dyn Validator<T>>>,
    last_validation: Mutex<Option<ValidationResult>>,
    channels: ChannelRegistry<T>,
}

impl<T> ValidatedCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cell holding `initial` that accepts every value.
    pub fn new(name: impl Into<String>, initial: T, with_metrics: bool) -> Self {
        let name = name.into();
        let channels = ChannelRegistry::new_with_property(name.clone(), None, None, with_metrics);
        channels.register_sub_channel(GET, SubChannel::message(GET, MEDIUM_BUFFER));
        channels.register_sub_channel(SET, SubChannel::message(SET, MEDIUM_BUFFER));
        channels.register_sub_channel(CLEAR, SubChannel::text(CLEAR, SMALL_BUFFER));

        Self {
            reference: Reference::new(name),
            value: LockSet::new(Arc::new(initial)),
            validator: None,
            last_validation: Mutex::new(None),
            channels,
        }
    }

    /// Gate future writes with `validator`.
    pub fn with_validator(mut self, validator: Arc<dyn Validator<T>>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn name(&self) -> &str {
        &self.reference.name
    }

    /// Notification channels (`get`, `set`, `clear` plus the defaults).
    pub fn channels(&self) -> &ChannelRegistry<T> {
        &self.channels
    }

    /// Current value.
    pub fn value(&self) -> Arc<T> {
        self.value.read().clone()
    }

    /// Read the value directly, or publish it on `get` when `publish` is set.
    ///
    /// Publishing is fire-and-forget and returns `None`.
    pub fn get(&self, publish: bool) -> Option<Arc<T>> {
        let current = self.value();
        if !publish {
            return Some(current);
        }
        self.notify(GET, T::clone(&current));
        None
    }

    /// Validate and commit `value`. Returns `false` if it was rejected.
    pub fn set(&self, value: T) -> bool {
        let verdict = match &self.validator {
            Some(validator) => validator.validate(&value),
            None => ValidationResult::valid(),
        };
        let accepted = verdict.is_valid;
        if !accepted {
            debug!("Cell {} rejected value: {}", self.name(), verdict.message);
        }
        *self.last_validation.lock() = Some(verdict);
        if !accepted {
            return false;
        }

        let value = Arc::new(value);
        let mut slot = self.value.write();
        *slot = value.clone();
        self.notify(SET, T::clone(&value));
        true
    }

    /// Publish a clear notification. The stored value is not reset.
    pub fn clear(&self) -> bool {
        let Some(channel) = self.channels.lookup_text(CLEAR) else {
            warn!("Cell {} has no clear channel", self.name());
            return false;
        };
        match channel.try_send(CLEAR.to_string()) {
            Ok(()) => true,
            Err(e) => {
                log_notify_failure(self.name(), CLEAR, &e);
                false
            }
        }
    }

    /// Verdict of the most recent [`set`](Self::set).
    pub fn last_validation(&self) -> Option<ValidationResult> {
        self.last_validation.lock().clone()
    }

    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    /// Close every notification channel.
    pub fn close(&self) -> Result<(), ChannelError> {
        self.channels.close()
    }

    fn notify(&self, channel: &str, value: T) -> bool {
        let Some(target) = self.channels.lookup_message(channel) else {
            warn!("Cell {} has no {} channel", self.name(), channel);
            return false;
        };
        match target.try_send(value) {
            Ok(()) => true,
            Err(e) => {
                log_notify_failure(self.name(), channel, &e);
                false
            }
        }
    }
}

impl<T> ValidatedCell<T>
where
    T: Clone + Send + Sync + Serialize + 'static,
{
    pub fn serialize(&self, format: Format) -> Result<Vec<u8>, FormatError> {
        codec::encode(&*self.value(), format)
    }
}

impl<T> ValidatedCell<T>
where
    T: Clone + Send + Sync + DeserializeOwned + 'static,
{
    /// Decode a value and commit it through [`set`](Self::set).
    pub fn deserialize(&self, data: &[u8], format: Format) -> Result<(), PropertyError> {
        let value: T = codec::decode(data, format)?;
        if self.set(value) {
            Ok(())
        } else {
            Err(PropertyError::Rejected(rejection_reason(self.last_validation())))
        }
    }
}

pub(crate) fn rejection_reason(verdict: Option<ValidationResult>) -> String {
    verdict
        .map(|v| v.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "validation failed".to_string())
}

fn log_notify_failure(cell: &str, channel: &str, error: &ChannelError) {
    match error {
        // No observer is draining the channel; the write itself stands.
        ChannelError::Full(_) => debug!("Cell {} dropped {} notification: {}", cell, channel, error),
        _ => warn!("Cell {} failed to publish {} notification: {}", cell, channel, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_protocols::FnValidator;

    fn positive() -> Arc<dyn Validator<i64>> {
        Arc::new(FnValidator::new(|v: &i64| {
            if *v > 0 {
                Ok(())
            } else {
                Err(format!("{} must be positive", v))
            }
        }))
    }

    #[test]
    fn test_initial_value() {
        let cell = ValidatedCell::new("count", 5i64, false);
        assert_eq!(*cell.value(), 5);
        assert_eq!(cell.get(false).as_deref(), Some(&5));
        assert_eq!(cell.name(), "count");
    }

    #[test]
    fn test_set_without_validator_accepts() {
        let cell = ValidatedCell::new("count", 0i64, false);
        assert!(cell.set(-3));
        assert_eq!(*cell.value(), -3);
    }

    #[test]
    fn test_rejected_set_keeps_value() {
        let cell = ValidatedCell::new("count", 1i64, false).with_validator(positive());
        assert!(!cell.set(-1));
        assert_eq!(cell.get(false).as_deref(), Some(&1));

        let verdict = cell.last_validation().unwrap();
        assert!(!verdict.is_valid);
        assert!(verdict.message.contains("must be positive"));
    }

    #[test]
    fn test_rejected_set_emits_nothing() {
        let cell = ValidatedCell::new("count", 1i64, false).with_validator(positive());
        cell.set(-1);
        assert!(cell.channels().lookup_message(SET).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accepted_set_emits_once() {
        let cell = ValidatedCell::new("count", 1i64, false).with_validator(positive());
        assert!(cell.set(42));

        let set = cell.channels().lookup_message(SET).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.recv().await, Some(42));
    }

    #[tokio::test]
    async fn test_get_publishes() {
        let cell = ValidatedCell::new("name", "alpha".to_string(), false);
        assert!(cell.get(true).is_none());

        let get = cell.channels().lookup_message(GET).unwrap();
        assert_eq!(get.recv().await.as_deref(), Some("alpha"));
    }

    #[tokio::test]
    async fn test_clear_publishes_without_reset() {
        let cell = ValidatedCell::new("count", 9i64, false);
        assert!(cell.clear());
        assert_eq!(*cell.value(), 9);

        let clear = cell.channels().lookup_text(CLEAR).unwrap();
        assert_eq!(clear.recv().await.as_deref(), Some("clear"));
    }

    #[test]
    fn test_set_survives_full_notification_channel() {
        let cell = ValidatedCell::new("count", 0i64, false);
        for i in 0..(MEDIUM_BUFFER as i64 + 3) {
            assert!(cell.set(i));
        }
        assert_eq!(*cell.value(), MEDIUM_BUFFER as i64 + 2);
    }

    #[test]
    fn test_set_after_close_still_commits() {
        let cell = ValidatedCell::new("count", 0i64, false);
        cell.close().unwrap();
        assert!(cell.set(4));
        assert_eq!(*cell.value(), 4);
        assert!(!cell.clear());
    }

    #[test]
    fn test_serialize_round_trip() {
        let source = ValidatedCell::new("count", 17i64, false);
        let target = ValidatedCell::new("count", 1i64, false).with_validator(positive());

        for format in [Format::Json, Format::Yaml] {
            let bytes = source.serialize(format).unwrap();
            target.deserialize(&bytes, format).unwrap();
            assert_eq!(*target.value(), 17);
        }
    }

    #[test]
    fn test_deserialize_rejected_value() {
        let cell = ValidatedCell::new("count", 1i64, false).with_validator(positive());
        let err = cell.deserialize(b"-5", Format::Json).unwrap_err();
        assert!(matches!(err, PropertyError::Rejected(ref m) if m.contains("must be positive")));
        assert_eq!(*cell.value(), 1);
    }

    #[test]
    fn test_deserialize_garbage() {
        let cell = ValidatedCell::new("count", 1i64, false);
        assert!(matches!(
            cell.deserialize(b"not a number", Format::Json),
            Err(PropertyError::Format(_))
        ));
    }

    #[test]
    fn test_concurrent_sets_never_tear() {
        #[derive(Clone)]
        struct Pair(u64, u64);

        let cell = Arc::new(ValidatedCell::new("pair", Pair(0, 0), false).with_validator(
            Arc::new(FnValidator::new(|p: &Pair| {
                if p.0 == p.1 { Ok(()) } else { Err("mismatch".to_string()) }
            })),
        ));

        let writers: Vec<_> = (1..=4u64)
            .map(|n| {
                let cell = cell.clone();
                std::thread::spawn(move || {
                    for i in 0..200 {
                        cell.set(Pair(n * 1000 + i, n * 1000 + i));
                        cell.set(Pair(1, 2));
                    }
                })
            })
            .collect();

        for _ in 0..1000 {
            let pair = cell.value();
            assert_eq!(pair.0, pair.1);
        }
        for writer in writers {
            writer.join().unwrap();
        }
    }
}
