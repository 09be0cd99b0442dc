//! Monitor frame framing
//!
//! The node wraps its monitor output in legacy terminal framing. These
//! helpers turn raw delimited chunks into plain text.

use super::error::MonitorError;

/// Read boundary while waiting for the telnet banner.
pub const HANDSHAKE_DELIMITER: u8 = b'\r';

/// Separates the port list header and each port descriptor.
pub const PORT_LIST_DELIMITER: u8 = b'|';

/// Terminates every monitor frame.
pub const FRAME_TERMINATOR: u8 = 0xFE;

/// Longest chunk accepted between two delimiters.
pub const MAX_CHUNK_LEN: usize = 64 * 1024;

/// Banner sent by the node once the telnet session is up.
pub const BANNER: &[u8] = b"Connected to TelnetServer\r";

/// Escape prefixes, longest first.
const ESCAPE_PREFIXES: [&[u8]; 2] = [&[0xFF, 0x1B, 0x11], &[0xFF, 0x1B]];

/// Whether a chunk read in the Connecting state completes the banner.
pub fn is_banner(chunk: &[u8]) -> bool {
    chunk.ends_with(BANNER)
}

/// Parse the `0xFF 0xFF <digit> |` header announcing the port count.
pub fn parse_port_list_header(chunk: &[u8]) -> Result<usize, MonitorError> {
    match chunk {
        [0xFF, 0xFF, digit, PORT_LIST_DELIMITER] if digit.is_ascii_digit() => {
            Ok(usize::from(digit - b'0'))
        }
        [0xFF, 0xFF, other, PORT_LIST_DELIMITER] => Err(MonitorError::ProtocolViolation(format!(
            "port count is not a digit: {other:#04x}"
        ))),
        _ => Err(MonitorError::ProtocolViolation(format!(
            "unexpected port list header ({} bytes)",
            chunk.len()
        ))),
    }
}

/// Strip the trailing delimiter from a port descriptor chunk.
pub fn port_descriptor(chunk: &[u8]) -> String {
    let body = chunk.strip_suffix(&[PORT_LIST_DELIMITER]).unwrap_or(chunk);
    String::from_utf8_lossy(body).into_owned()
}

/// Remove at most one escape prefix, preferring the longest match.
pub fn strip_escape(frame: &[u8]) -> &[u8] {
    ESCAPE_PREFIXES
        .iter()
        .find_map(|prefix| frame.strip_prefix(*prefix))
        .unwrap_or(frame)
}

/// Turn one raw monitor frame into display text.
///
/// Drops the terminator and escape prefix, one leading `[` and one
/// trailing CR, then maps the remaining CRs to LF.
pub fn clean_frame(raw: &[u8]) -> String {
    let frame = raw.strip_suffix(&[FRAME_TERMINATOR]).unwrap_or(raw);
    let frame = strip_escape(frame);
    let frame = frame.strip_prefix(b"[").unwrap_or(frame);
    let frame = frame.strip_suffix(b"\r").unwrap_or(frame);

    String::from_utf8_lossy(frame).replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_detection() {
        assert!(is_banner(b"\xff\xfbsome noise Connected to TelnetServer\r"));
        assert!(!is_banner(b"Connected to TelnetServer"));
        assert!(!is_banner(b"password:\r"));
    }

    #[test]
    fn test_port_list_header() {
        assert_eq!(parse_port_list_header(b"\xff\xff3|").unwrap(), 3);
        assert_eq!(parse_port_list_header(b"\xff\xff0|").unwrap(), 0);
    }

    #[test]
    fn test_port_list_header_malformed() {
        for chunk in [
            &b"\xff\xffx|"[..],
            &b"\xff\xff12|"[..],
            &b"\xff\x003|"[..],
            &b"3|"[..],
            &b"|"[..],
        ] {
            assert!(matches!(
                parse_port_list_header(chunk),
                Err(MonitorError::ProtocolViolation(_))
            ));
        }
    }

    #[test]
    fn test_port_descriptor() {
        assert_eq!(port_descriptor(b"1 VHF 1200|"), "1 VHF 1200");
        assert_eq!(port_descriptor(b"no delimiter"), "no delimiter");
    }

    #[test]
    fn test_long_escape_wins() {
        assert_eq!(strip_escape(b"\xff\x1b\x11[hello"), b"[hello");
        assert_eq!(strip_escape(b"\xff\x1b\x12hello"), b"\x12hello");
        assert_eq!(strip_escape(b"hello"), b"hello");
    }

    #[test]
    fn test_only_one_escape_stripped() {
        assert_eq!(strip_escape(b"\xff\x1b\xff\x1bx"), b"\xff\x1bx");
    }

    #[test]
    fn test_clean_frame() {
        let raw = b"\xff\x1b\x11[16:34:33R TNC>USB Port=1 hello\rworld\r\xfe";
        assert_eq!(clean_frame(raw), "16:34:33R TNC>USB Port=1 hello\nworld");
    }

    #[test]
    fn test_clean_frame_strips_single_bracket_and_cr() {
        assert_eq!(clean_frame(b"[[x\r\r\xfe"), "[x\n");
    }
}
