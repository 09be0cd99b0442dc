//! TNC Telemetry Decoder
//!
//! Some TNCs beacon their counters as a UI frame addressed to the node.
//! After monitor cleanup such a frame looks like:
//!
//! ```text
//! 16:34:33R TNC>USB Port=1 <UI C>:=00:2.76=01:13FAAAAut=02:0010FB70=0A:00000022
//! ```
//!
//! Everything before the `<UI C>:` marker identifies the radio port. The
//! payload is a sequence of `=ID:VALUE` fields where `ID` is a two digit
//! hex field number.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::duration::humanize_millis;

/// Separates the port prefix from the telemetry payload.
pub const TELEMETRY_MARKER: &str = " <UI C>:";

/// Port reported when the prefix carries no usable `Port=` value.
pub const DEFAULT_PORT: u32 = 1;

/// Known telemetry field numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldId {
    FirmwareVersion = 0x00,
    Kaup8r = 0x01,
    UptimeMillis = 0x02,
    BoardId = 0x03,
    SwitchPositions = 0x04,
    ConfigMode = 0x06,
    Ax25ReceivedPackets = 0x07,
    Il2pCorrectablePackets = 0x08,
    Il2pUncorrectablePackets = 0x09,
    TransmitPackets = 0x0A,
    PreambleWordCount = 0x0B,
    MainLoopCycleCount = 0x0C,
    PttOnTimeMillis = 0x0D,
    DcdOnTimeMillis = 0x0E,
    ReceivedDataBytes = 0x0F,
    TransmitDataBytes = 0x10,
    FecBytesCorrected = 0x11,
}

impl FieldId {
    /// Map a raw field number, `None` for numbers this decoder doesn't know.
    pub fn from_u8(id: u8) -> Option<Self> {
        let field = match id {
            0x00 => Self::FirmwareVersion,
            0x01 => Self::Kaup8r,
            0x02 => Self::UptimeMillis,
            0x03 => Self::BoardId,
            0x04 => Self::SwitchPositions,
            0x06 => Self::ConfigMode,
            0x07 => Self::Ax25ReceivedPackets,
            0x08 => Self::Il2pCorrectablePackets,
            0x09 => Self::Il2pUncorrectablePackets,
            0x0A => Self::TransmitPackets,
            0x0B => Self::PreambleWordCount,
            0x0C => Self::MainLoopCycleCount,
            0x0D => Self::PttOnTimeMillis,
            0x0E => Self::DcdOnTimeMillis,
            0x0F => Self::ReceivedDataBytes,
            0x10 => Self::TransmitDataBytes,
            0x11 => Self::FecBytesCorrected,
            _ => return None,
        };
        Some(field)
    }

    /// Whether the field carries text rather than a hex counter.
    pub fn is_text(self) -> bool {
        matches!(self, Self::FirmwareVersion | Self::Kaup8r)
    }
}

/// A single decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryValue {
    Text(String),
    Counter(u64),
}

/// Counters reported by one telemetry beacon.
///
/// Fields missing from the beacon stay at their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub firmware_version: String,
    pub kaup8r: String,
    pub uptime_millis: u64,
    pub uptime: String,
    pub board_id: u64,
    pub switch_positions: u64,
    pub config_mode: u64,
    pub ax25_received_packets: u64,
    pub il2p_correctable_packets: u64,
    pub il2p_uncorrectable_packets: u64,
    pub transmit_packets: u64,
    pub preamble_word_count: u64,
    pub main_loop_cycle_count: u64,
    pub ptt_on_time_millis: u64,
    pub ptt_on_time: String,
    pub dcd_on_time_millis: u64,
    pub dcd_on_time: String,
    pub received_data_bytes: u64,
    pub transmit_data_bytes: u64,
    pub fec_bytes_corrected: u64,
}

impl TelemetryRecord {
    /// Read a field by number.
    pub fn get(&self, field: FieldId) -> TelemetryValue {
        use TelemetryValue::{Counter, Text};
        match field {
            FieldId::FirmwareVersion => Text(self.firmware_version.clone()),
            FieldId::Kaup8r => Text(self.kaup8r.clone()),
            FieldId::UptimeMillis => Counter(self.uptime_millis),
            FieldId::BoardId => Counter(self.board_id),
            FieldId::SwitchPositions => Counter(self.switch_positions),
            FieldId::ConfigMode => Counter(self.config_mode),
            FieldId::Ax25ReceivedPackets => Counter(self.ax25_received_packets),
            FieldId::Il2pCorrectablePackets => Counter(self.il2p_correctable_packets),
            FieldId::Il2pUncorrectablePackets => Counter(self.il2p_uncorrectable_packets),
            FieldId::TransmitPackets => Counter(self.transmit_packets),
            FieldId::PreambleWordCount => Counter(self.preamble_word_count),
            FieldId::MainLoopCycleCount => Counter(self.main_loop_cycle_count),
            FieldId::PttOnTimeMillis => Counter(self.ptt_on_time_millis),
            FieldId::DcdOnTimeMillis => Counter(self.dcd_on_time_millis),
            FieldId::ReceivedDataBytes => Counter(self.received_data_bytes),
            FieldId::TransmitDataBytes => Counter(self.transmit_data_bytes),
            FieldId::FecBytesCorrected => Counter(self.fec_bytes_corrected),
        }
    }

    fn set_text(&mut self, field: FieldId, value: &str) {
        match field {
            FieldId::FirmwareVersion => self.firmware_version = value.to_string(),
            FieldId::Kaup8r => self.kaup8r = value.to_string(),
            _ => {}
        }
    }

    fn set_counter(&mut self, field: FieldId, value: u64) {
        let slot = match field {
            FieldId::UptimeMillis => &mut self.uptime_millis,
            FieldId::BoardId => &mut self.board_id,
            FieldId::SwitchPositions => &mut self.switch_positions,
            FieldId::ConfigMode => &mut self.config_mode,
            FieldId::Ax25ReceivedPackets => &mut self.ax25_received_packets,
            FieldId::Il2pCorrectablePackets => &mut self.il2p_correctable_packets,
            FieldId::Il2pUncorrectablePackets => &mut self.il2p_uncorrectable_packets,
            FieldId::TransmitPackets => &mut self.transmit_packets,
            FieldId::PreambleWordCount => &mut self.preamble_word_count,
            FieldId::MainLoopCycleCount => &mut self.main_loop_cycle_count,
            FieldId::PttOnTimeMillis => &mut self.ptt_on_time_millis,
            FieldId::DcdOnTimeMillis => &mut self.dcd_on_time_millis,
            FieldId::ReceivedDataBytes => &mut self.received_data_bytes,
            FieldId::TransmitDataBytes => &mut self.transmit_data_bytes,
            FieldId::FecBytesCorrected => &mut self.fec_bytes_corrected,
            FieldId::FirmwareVersion | FieldId::Kaup8r => return,
        };
        *slot = value;
    }

    fn fill_durations(&mut self) {
        self.uptime = humanize_millis(self.uptime_millis);
        self.ptt_on_time = humanize_millis(self.ptt_on_time_millis);
        self.dcd_on_time = humanize_millis(self.dcd_on_time_millis);
    }
}

/// Reasons a frame did not yield a telemetry record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    /// The frame carries no telemetry payload. Not a fault.
    #[error("not a telemetry frame")]
    NotTelemetry,

    /// A field number was not two hex digits; the record is discarded.
    #[error("malformed telemetry field: {0:?}")]
    MalformedField(String),
}

/// Decode one telemetry beacon from normalized monitor text.
///
/// Returns the radio port and the populated record.
pub fn decode_telemetry(text: &str) -> Result<(u32, TelemetryRecord), TelemetryError> {
    let (prefix, payload) = text
        .split_once(TELEMETRY_MARKER)
        .ok_or(TelemetryError::NotTelemetry)?;

    let port = parse_port(prefix);

    // The first segment precedes any field and is discarded.
    let mut segments = payload.split('=');
    segments.next();

    let mut fields = segments.peekable();
    if fields.peek().is_none() {
        return Err(TelemetryError::NotTelemetry);
    }

    let mut record = TelemetryRecord::default();
    for field in fields {
        // Truncated trailing fields are common.
        if field.len() < 3 {
            continue;
        }

        let id = field
            .get(..2)
            .and_then(parse_field_id)
            .ok_or_else(|| TelemetryError::MalformedField(field.to_string()))?;

        let Some(field_id) = FieldId::from_u8(id) else {
            continue;
        };

        let value = field.get(3..).unwrap_or_default();
        if field_id.is_text() {
            record.set_text(field_id, value);
        } else {
            record.set_counter(field_id, parse_counter(value));
        }
    }

    record.fill_durations();
    Ok((port, record))
}

fn parse_port(prefix: &str) -> u32 {
    prefix
        .rsplit_once("Port=")
        .map(|(_, rest)| {
            rest.find(|c: char| !c.is_ascii_digit())
                .map_or(rest, |end| &rest[..end])
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn parse_field_id(hex: &str) -> Option<u8> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(hex, 16).ok()
}

fn parse_counter(value: &str) -> u64 {
    let value = value.trim_end();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return 0;
    }
    u64::from_str_radix(value, 16).unwrap_or(0)
}
