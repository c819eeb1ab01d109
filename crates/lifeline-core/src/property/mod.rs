//! Validated value cells with channel-backed change notification.

mod cell;
mod facade;
mod telemetry;

pub use cell::{ValidatedCell, CLEAR, GET, SET};
pub use facade::{PostSetCallback, Property};
pub use telemetry::{Telemetry, TelemetrySnapshot};
