//! Property: a validated cell with a post-set observer and optional
//! telemetry.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use lifeline_protocols::{Format, FormatError, PropertyError, Reference, Validator};

use super::cell::{rejection_reason, ValidatedCell};
use super::telemetry::Telemetry;
use crate::codec;
use crate::registry::{ChannelRegistry, TELEMETRY};

/// Observer run after every committed write. An `Err` or `Ok(false)` is
/// logged and otherwise ignored.
pub type PostSetCallback<T> = Box<dyn Fn(&T) -> Result<bool, String> + Send + Sync>;

const SETS_TOTAL: &str = "sets_total";
const REJECTIONS_TOTAL: &str = "rejections_total";
const CALLBACK_ERRORS_TOTAL: &str = "callback_errors_total";

/// Validated value with a post-set callback.
pub struct Property<T> {
    cell: ValidatedCell<T>,
    telemetry: Option<Telemetry>,
    callback: Option<PostSetCallback<T>>,
}

impl<T> Property<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        name: impl Into<String>,
        initial: T,
        with_metrics: bool,
        callback: Option<PostSetCallback<T>>,
    ) -> Self {
        Self {
            cell: ValidatedCell::new(name, initial, with_metrics),
            telemetry: with_metrics.then(Telemetry::new),
            callback,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator<T>>) -> Self {
        self.cell = self.cell.with_validator(validator);
        self
    }

    pub fn reference(&self) -> &Reference {
        self.cell.reference()
    }

    pub fn name(&self) -> &str {
        self.cell.name()
    }

    pub fn cell(&self) -> &ValidatedCell<T> {
        &self.cell
    }

    pub fn channels(&self) -> &ChannelRegistry<T> {
        self.cell.channels()
    }

    pub fn telemetry(&self) -> Option<&Telemetry> {
        self.telemetry.as_ref()
    }

    pub fn get_value(&self) -> T {
        T::clone(&self.cell.value())
    }

    pub fn get(&self, publish: bool) -> Option<Arc<T>> {
        self.cell.get(publish)
    }

    /// Commit `value` through the cell, then run the callback.
    pub fn set_value(&self, value: T) -> bool {
        if !self.cell.set(value.clone()) {
            self.record(REJECTIONS_TOTAL);
            return false;
        }

        if let Some(callback) = &self.callback {
            match callback(&value) {
                Ok(true) => {}
                Ok(false) => debug!("Post-set callback of {} declined the value", self.name()),
                Err(e) => {
                    warn!("Post-set callback of {} failed: {}", self.name(), e);
                    self.record(CALLBACK_ERRORS_TOTAL);
                }
            }
        }
        self.record(SETS_TOTAL);
        self.publish_telemetry();
        true
    }

    pub fn clear(&self) -> bool {
        self.cell.clear()
    }

    fn record(&self, metric: &str) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.increment(metric);
        }
    }

    fn publish_telemetry(&self) {
        let Some(telemetry) = &self.telemetry else {
            return;
        };
        let Some(channel) = self.cell.channels().lookup_text(TELEMETRY) else {
            return;
        };
        match serde_json::to_string(&telemetry.snapshot()) {
            Ok(snapshot) => {
                if let Err(e) = channel.try_send(snapshot) {
                    debug!("Telemetry of {} not published: {}", self.name(), e);
                }
            }
            Err(e) => warn!("Telemetry of {} not serializable: {}", self.name(), e),
        }
    }
}

impl<T> Property<T>
where
    T: Clone + Send + Sync + Serialize + 'static,
{
    pub fn serialize(&self, format: Format) -> Result<Vec<u8>, FormatError> {
        self.cell.serialize(format)
    }

    pub fn save_to_file(&self, path: &Path, format: Format) -> Result<(), PropertyError> {
        codec::write_file(path, &*self.cell.value(), format)
    }
}

impl<T> Property<T>
where
    T: Clone + Send + Sync + DeserializeOwned + 'static,
{
    /// Decode a value and commit it through [`set_value`](Self::set_value).
    pub fn deserialize(&self, data: &[u8], format: Format) -> Result<(), PropertyError> {
        let value: T = codec::decode(data, format)?;
        self.commit_decoded(value)
    }

    pub fn load_from_file(&self, path: &Path, format: Format) -> Result<(), PropertyError> {
        let value: T = codec::read_file(path, format)?;
        self.commit_decoded(value)
    }

    fn commit_decoded(&self, value: T) -> Result<(), PropertyError> {
        if self.set_value(value) {
            Ok(())
        } else {
            Err(PropertyError::Rejected(rejection_reason(
                self.cell.last_validation(),
            )))
        }
    }
}
