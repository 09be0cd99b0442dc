//! TNC Telemetry
//!
//! Decoding of the counter beacons some TNCs embed in monitor frames.

mod decoder;
mod duration;

pub use decoder::{
    decode_telemetry, FieldId, TelemetryError, TelemetryRecord, TelemetryValue, DEFAULT_PORT,
    TELEMETRY_MARKER,
};
pub use duration::humanize_millis;
