//! Dashboard event model
//!
//! Every event is sent to dashboards as one JSON object discriminated by
//! its `type` field.

use serde::{Deserialize, Serialize};

use super::color::RouteColor;
use super::logline::{parse_log_line, Direction, LogLine};
use crate::telemetry::{decode_telemetry, TelemetryError, TelemetryRecord};

/// Events published to dashboards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A monitor line matching the log grammar
    Log(LogEvent),
    /// Monitor text that doesn't match the log grammar
    Raw(RawEvent),
    /// A decoded TNC telemetry beacon
    #[serde(rename = "tnc_data")]
    Telemetry(TelemetryEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub timestamp: String,
    pub direction: Direction,
    pub route: String,
    pub port: u32,
    pub message: String,
    pub route_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub port_num: u32,
    pub data: TelemetryRecord,
}

impl MonitorEvent {
    pub fn log(line: LogLine, route_color: String) -> Self {
        Self::Log(LogEvent {
            timestamp: line.timestamp,
            direction: line.direction,
            route: line.route,
            port: line.port,
            message: line.message,
            route_color,
        })
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(RawEvent { raw: text.into() })
    }

    pub fn telemetry(port_num: u32, data: TelemetryRecord) -> Self {
        Self::Telemetry(TelemetryEvent { port_num, data })
    }

    /// Serialize to the dashboard wire format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Events produced by one monitor frame.
///
/// A frame is tried as telemetry and as a log line independently, so it
/// yields its line event and, for telemetry beacons, a telemetry event
/// published ahead of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameEvents {
    pub telemetry: Option<MonitorEvent>,
    pub line: MonitorEvent,
}

impl FrameEvents {
    /// Interpret one cleaned monitor frame.
    pub fn interpret(text: &str, colors: &dyn RouteColor) -> Self {
        let telemetry = match decode_telemetry(text) {
            Ok((port, record)) => Some(MonitorEvent::telemetry(port, record)),
            Err(TelemetryError::NotTelemetry) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Discarding malformed telemetry beacon");
                None
            }
        };

        let line = match parse_log_line(text) {
            Some(line) => {
                let color = colors.color_for(&line.route);
                MonitorEvent::log(line, color)
            }
            None => MonitorEvent::raw(text),
        };

        Self { telemetry, line }
    }

    /// Events in publish order.
    pub fn into_events(self) -> impl Iterator<Item = MonitorEvent> {
        self.telemetry.into_iter().chain(std::iter::once(self.line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::color::HslRouteColor;

    struct FixedColor;

    impl RouteColor for FixedColor {
        fn color_for(&self, _route: &str) -> String {
            "red".to_string()
        }
    }

    #[test]
    fn test_log_line_frame() {
        let events = FrameEvents::interpret("16:34:33R TNC>USB Port=1 hello world", &FixedColor);
        assert!(events.telemetry.is_none());
        match events.line {
            MonitorEvent::Log(log) => {
                assert_eq!(log.timestamp, "16:34:33");
                assert_eq!(log.direction, Direction::Received);
                assert_eq!(log.route, "TNC>USB");
                assert_eq!(log.port, 1);
                assert_eq!(log.message, "hello world");
                assert_eq!(log.route_color, "red");
            }
            other => panic!("Expected Log, got {other:?}"),
        }
    }

    #[test]
    fn test_huge_port_still_logs() {
        let events = FrameEvents::interpret("16:34:33R TNC>USB Port=99999999999 hello", &FixedColor);
        assert!(matches!(events.line, MonitorEvent::Log(log) if log.port == u32::MAX));
    }

    #[test]
    fn test_raw_frame_preserves_text() {
        let text = "*** Connected to node\nWelcome\n";
        let events = FrameEvents::interpret(text, &FixedColor);
        assert_eq!(events.line, MonitorEvent::raw(text));
        assert_eq!(events.into_events().count(), 1);
    }

    #[test]
    fn test_telemetry_frame_yields_both_events() {
        let text = "16:34:33R TNC>USB Port=2 <UI C>:=00:2.76=0A:00000022";
        let events: Vec<_> = FrameEvents::interpret(text, &HslRouteColor)
            .into_events()
            .collect();

        assert_eq!(events.len(), 2);
        match &events[0] {
            MonitorEvent::Telemetry(t) => {
                assert_eq!(t.port_num, 2);
                assert_eq!(t.data.transmit_packets, 34);
            }
            other => panic!("Expected Telemetry, got {other:?}"),
        }
        assert!(matches!(&events[1], MonitorEvent::Log(log) if log.port == 2));
    }

    #[test]
    fn test_malformed_telemetry_still_logs() {
        let text = "16:34:33R TNC>USB Port=1 <UI C>:=ZZ:INVALID";
        let events = FrameEvents::interpret(text, &FixedColor);
        assert!(events.telemetry.is_none());
        assert!(matches!(events.line, MonitorEvent::Log(_)));
    }

    #[test]
    fn test_wire_format() {
        let json = MonitorEvent::raw("hi").to_json().unwrap();
        assert_eq!(json, r#"{"type":"raw","raw":"hi"}"#);

        let events = FrameEvents::interpret("16:34:33T A>B Port=3 msg", &FixedColor);
        let value: serde_json::Value = serde_json::from_str(&events.line.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "log");
        assert_eq!(value["direction"], "T");
        assert_eq!(value["routeColor"], "red");
        assert_eq!(value["port"], 3);
    }

    #[test]
    fn test_events_round_trip() {
        let text = "16:34:33R TNC>USB Port=1 <UI C>:=00:2.76=02:0010FB70";
        for event in FrameEvents::interpret(text, &HslRouteColor).into_events() {
            let json = event.to_json().unwrap();
            let back: MonitorEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(back, event);
        }
    }
}
