//! Monitor log-line grammar
//!
//! `HH:MM:SS<R|T> FROM>TO Port=<n> <message>`, where the message may span
//! several lines.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Whether the node received or transmitted the logged packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "R")]
    Received,
    #[serde(rename = "T")]
    Transmitted,
}

impl Direction {
    fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "R" => Some(Self::Received),
            "T" => Some(Self::Transmitted),
            _ => None,
        }
    }
}

/// One parsed monitor log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: String,
    pub direction: Direction,
    pub route: String,
    pub port: u32,
    pub message: String,
}

fn grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"(?s)^([0-9]{2}:[0-9]{2}:[0-9]{2})([RT]) ([A-Z0-9-]+>[A-Z0-9-]+) Port=([0-9]+) (.*)")
            .expect("log-line grammar is a valid regex")
    })
}

/// Match normalized monitor text against the log-line grammar.
pub fn parse_log_line(text: &str) -> Option<LogLine> {
    let caps = grammar().captures(text)?;

    Some(LogLine {
        timestamp: caps[1].to_string(),
        direction: Direction::from_flag(&caps[2])?,
        route: caps[3].to_string(),
        // Only overflow can fail here; keep the line and saturate.
        port: caps[4].parse().unwrap_or(u32::MAX),
        message: caps[5].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_line() {
        let line = parse_log_line("16:34:33R TNC>USB Port=1 hello world").unwrap();
        assert_eq!(line.timestamp, "16:34:33");
        assert_eq!(line.direction, Direction::Received);
        assert_eq!(line.route, "TNC>USB");
        assert_eq!(line.port, 1);
        assert_eq!(line.message, "hello world");
    }

    #[test]
    fn test_multiline_message() {
        let line = parse_log_line("09:00:01T G4ABC-1>ID Port=11 <UI C>:\nG4ABC-1/B BBS\n").unwrap();
        assert_eq!(line.direction, Direction::Transmitted);
        assert_eq!(line.route, "G4ABC-1>ID");
        assert_eq!(line.port, 11);
        assert_eq!(line.message, "<UI C>:\nG4ABC-1/B BBS\n");
    }

    #[test]
    fn test_non_matching_lines() {
        assert!(parse_log_line("").is_none());
        assert!(parse_log_line("Welcome to the node").is_none());
        assert!(parse_log_line("16:34:33X TNC>USB Port=1 hi").is_none());
        assert!(parse_log_line("16:34:33R tnc>usb Port=1 hi").is_none());
        assert!(parse_log_line("16:34:33R TNC>USB Port=1").is_none());
    }

    #[test]
    fn test_oversized_port_saturates() {
        let line = parse_log_line("16:34:33R TNC>USB Port=99999999999 hello").unwrap();
        assert_eq!(line.port, u32::MAX);
        assert_eq!(line.message, "hello");
    }

    #[test]
    fn test_only_ascii_digits() {
        assert!(parse_log_line("\u{661}\u{666}:34:33R TNC>USB Port=1 hello").is_none());
        assert!(parse_log_line("16:34:33R TNC>USB Port=\u{661} hello").is_none());
    }

    #[test]
    fn test_direction_serializes_as_flag() {
        assert_eq!(serde_json::to_string(&Direction::Received).unwrap(), "\"R\"");
        assert_eq!(serde_json::to_string(&Direction::Transmitted).unwrap(), "\"T\"");
    }
}
