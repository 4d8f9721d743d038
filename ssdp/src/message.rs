//! Building and parsing SSDP packets.
//!
//! The wire format is an HTTP-header-shaped text protocol: a start
//! line, then CRLF-terminated `Field: value` lines, then a blank line.
//! The builders below write that shape into a caller-owned buffer; the
//! parser reads it back out tolerant of the kind of malformed header
//! lines real SSDP traffic is full of.

use core::fmt::Write as _;

/// Longest a recognized header field value may be; longer values are
/// truncated, not rejected.
pub const FIELD_MAX: usize = 127;

/// Which of the three packet shapes a parsed or to-be-built packet is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Method {
    MSearch,
    Notify,
    Response,
}

/// A packet once its start line and recognized header fields have been
/// extracted. Every text field is truncated to [`FIELD_MAX`] bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPacket {
    pub method: Method,
    pub st: String,
    pub usn: String,
    pub location: String,
    pub sm_id: String,
    pub device_type: String,
    pub update_time_ms: u64,
}

/// Start-line mismatch, or a timestamp that could not be obtained:
/// the only whole-packet parse failures. A malformed header line does
/// not fail the parse; it is just skipped.
#[derive(Debug)]
pub struct UnrecognizedPacket;

const MSEARCH_LINE: &str = "M-SEARCH * HTTP/1.1\r\n";
const NOTIFY_LINE: &str = "NOTIFY * HTTP/1.1\r\n";
const RESPONSE_LINE: &str = "HTTP/1.1 200 OK\r\n";

fn truncate_field(s: &str) -> String {
    let mut owned = s.to_string();
    if owned.len() > FIELD_MAX {
        let mut cut = FIELD_MAX;
        while !owned.is_char_boundary(cut) {
            cut -= 1;
        }
        owned.truncate(cut);
    }
    owned
}

/// Parses one field/value header line, per the tolerant rules in
/// §4.C.2: a leading colon, a missing colon, or an empty trimmed value
/// are all rejections of that single line (the overall parse
/// continues).
fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    if line.starts_with(':') {
        return None;
    }
    let colon = line[1..].find(':').map(|i| i + 1)?;
    let (field, rest) = line.split_at(colon);
    let value = &rest[1..];

    let trimmed_field = field.trim();
    let trimmed_value = value.trim();
    if trimmed_field.is_empty() || trimmed_value.is_empty() {
        return None;
    }
    Some((trimmed_field, trimmed_value))
}

fn dispatch_field(packet: &mut ParsedPacket, field: &str, value: &str) {
    match field.to_ascii_lowercase().as_str() {
        "st" => packet.st = truncate_field(value),
        "usn" => packet.usn = truncate_field(value),
        "location" => packet.location = truncate_field(value),
        "sm_id" => packet.sm_id = truncate_field(value),
        "dev_type" => packet.device_type = truncate_field(value),
        _ => {}
    }
}

/// Parses a received datagram into a [`ParsedPacket`].
///
/// `now_ms` is stamped into `update_time_ms`; the caller supplies it
/// rather than this function calling a clock, so the coordinator's
/// notion of "now" stays single-sourced and testable.
///
/// Line-level defects (bad header syntax, unrecognized fields) are
/// silently skipped; only an unrecognized start line fails the whole
/// parse, returning [`UnrecognizedPacket`] so the caller can log it.
pub fn parse(buf: &[u8], now_ms: u64) -> Result<ParsedPacket, UnrecognizedPacket> {
    let text = std::str::from_utf8(buf).map_err(|_| UnrecognizedPacket)?;

    let method = if let Some(rest) = text.strip_prefix(MSEARCH_LINE) {
        (Method::MSearch, rest)
    } else if let Some(rest) = text.strip_prefix(NOTIFY_LINE) {
        (Method::Notify, rest)
    } else if let Some(rest) = text.strip_prefix(RESPONSE_LINE) {
        (Method::Response, rest)
    } else {
        return Err(UnrecognizedPacket);
    };

    let mut packet = ParsedPacket {
        method: method.0,
        st: String::new(),
        usn: String::new(),
        location: String::new(),
        sm_id: String::new(),
        device_type: String::new(),
        update_time_ms: now_ms,
    };

    for line in method.1.split("\r\n") {
        if line.is_empty() {
            continue;
        }
        if let Some((field, value)) = parse_header_line(line) {
            dispatch_field(&mut packet, field, value);
        }
    }

    Ok(packet)
}

/// A `no_std`-friendly replacement for `std::io::Cursor`, following
/// the teacher's own `MessageCursor`: a fixed buffer plus an offset,
/// implementing `core::fmt::Write` so `write!` can target it.
struct MessageCursor<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

impl<'a> MessageCursor<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        MessageCursor { buf, offset: 0 }
    }

    const fn position(&self) -> usize {
        self.offset
    }
}

impl core::fmt::Write for MessageCursor<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let n = s.len();
        if n + self.offset > self.buf.len() {
            return Err(core::fmt::Error);
        }
        self.buf[self.offset..self.offset + n].copy_from_slice(s.as_bytes());
        self.offset += n;
        Ok(())
    }
}

/// Composes the `LOCATION` header value: `host[:port][/uri]`.
/// `port == 0` suppresses the port segment; an empty `uri` suppresses
/// the path segment.
pub fn build_location(host: &str, port: u16, uri: &str) -> String {
    let mut s = host.to_string();
    if port != 0 {
        write!(s, ":{port}").ok();
    }
    if !uri.is_empty() {
        write!(s, "/{uri}").ok();
    }
    s
}

/// Builds an `M-SEARCH * HTTP/1.1` request into `buf`, returning the
/// byte length written.
pub fn build_msearch(buf: &mut [u8], port: u16, st: &str) -> usize {
    let mut cursor = MessageCursor::new(buf);
    let _ = write!(
        cursor,
        "M-SEARCH * HTTP/1.1\r\nHOST:239.255.255.250:{port}\r\nMAN:\"ssdp:discover\"\r\nST:{st}\r\nMX:1\r\n\r\n"
    );
    cursor.position()
}

/// Builds a `NOTIFY * HTTP/1.1` announcement into `buf`.
#[allow(clippy::too_many_arguments)]
pub fn build_notify(
    buf: &mut [u8],
    port: u16,
    st: &str,
    usn: &str,
    location: &str,
    sm_id: &str,
    device_type: &str,
) -> usize {
    let mut cursor = MessageCursor::new(buf);
    let _ = write!(
        cursor,
        "NOTIFY * HTTP/1.1\r\nHOST:239.255.255.250:{port}\r\nCACHE-CONTROL: max-age=120\r\nST:{st}\r\nUSN:{usn}\r\nLOCATION:{location}\r\nSM_ID:{sm_id}\r\nDEV_TYPE:{device_type}\r\nNTS:ssdp:alive\r\n\r\n"
    );
    cursor.position()
}

/// Builds an `HTTP/1.1 200 OK` response to an `M-SEARCH` into `buf`.
///
/// No `DATE` header: producing one correctly needs a calendar (leap
/// years, month lengths) this crate has no dependency for, and
/// nothing on the receiving end parses it back.
pub fn build_response(
    buf: &mut [u8],
    st: &str,
    usn: &str,
    location: &str,
    sm_id: &str,
    device_type: &str,
) -> usize {
    let mut cursor = MessageCursor::new(buf);
    let _ = write!(
        cursor,
        "HTTP/1.1 200 OK\r\nCACHE-CONTROL: max-age=120\r\nEXT:\r\nLOCATION:{location}\r\nSERVER: {}/{} UPnP/1.1 {}/{}\r\nST:{st}\r\nUSN:{usn}\r\nSM_ID:{sm_id}\r\nDEV_TYPE:{device_type}\r\n\r\n",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    );
    cursor.position()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_msearch_with_no_headers() {
        let p = parse(b"M-SEARCH * HTTP/1.1\r\n", 1).unwrap();
        assert_eq!(p.method, Method::MSearch);
        assert_eq!(p.st, "");
    }

    #[test]
    fn rejects_unknown_start_line() {
        assert!(parse(b"GET / HTTP/1.1\r\n", 1).is_err());
    }

    #[test]
    fn rejects_leading_colon_line() {
        let p = parse(b"NOTIFY * HTTP/1.1\r\n: value\r\nST:ST_P2P\r\n\r\n", 1).unwrap();
        assert_eq!(p.st, "ST_P2P");
    }

    #[test]
    fn rejects_missing_colon_line() {
        let p = parse(b"NOTIFY * HTTP/1.1\r\nNoColonHere\r\nST:ST_P2P\r\n\r\n", 1).unwrap();
        assert_eq!(p.st, "ST_P2P");
    }

    #[test]
    fn rejects_empty_value_line() {
        let p = parse(b"NOTIFY * HTTP/1.1\r\nST:\r\nUSN:nodeX\r\n\r\n", 1).unwrap();
        assert_eq!(p.st, "");
        assert_eq!(p.usn, "nodeX");
    }

    #[test]
    fn field_dispatch_is_case_insensitive_and_trims() {
        let p = parse(b"NOTIFY * HTTP/1.1\r\n  St  :  ST_P2P  \r\n\r\n", 1).unwrap();
        assert_eq!(p.st, "ST_P2P");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let p = parse(b"NOTIFY * HTTP/1.1\r\nX-Custom:whatever\r\nST:ST_P2P\r\n\r\n", 1).unwrap();
        assert_eq!(p.st, "ST_P2P");
    }

    #[test]
    fn long_field_value_is_truncated_to_127_bytes() {
        let long = "A".repeat(200);
        let packet = format!("NOTIFY * HTTP/1.1\r\nST:{long}\r\n\r\n");
        let p = parse(packet.as_bytes(), 1).unwrap();
        assert_eq!(p.st.len(), FIELD_MAX);
        assert!(p.st.chars().all(|c| c == 'A'));
    }

    #[test]
    fn timestamp_is_stamped_from_caller() {
        let p = parse(b"M-SEARCH * HTTP/1.1\r\n", 424242).unwrap();
        assert_eq!(p.update_time_ms, 424242);
    }

    #[test]
    fn location_composition_omits_absent_port_and_uri() {
        assert_eq!(build_location("192.168.1.10", 0, ""), "192.168.1.10");
        assert_eq!(build_location("192.168.1.10", 5678, ""), "192.168.1.10:5678");
        assert_eq!(build_location("192.168.1.10", 0, "desc.xml"), "192.168.1.10/desc.xml");
        assert_eq!(
            build_location("192.168.1.10", 5678, "desc.xml"),
            "192.168.1.10:5678/desc.xml"
        );
    }

    #[test]
    fn build_msearch_round_trips_through_parse() {
        let mut buf = [0u8; 512];
        let n = build_msearch(&mut buf, 1900, "ST_P2P");
        let p = parse(&buf[..n], 1).unwrap();
        assert_eq!(p.method, Method::MSearch);
        assert_eq!(p.st, "ST_P2P");
    }

    #[test]
    fn build_notify_round_trips_recognized_fields() {
        let mut buf = [0u8; 512];
        let n = build_notify(
            &mut buf,
            1900,
            "ST_P2P",
            "nodeX",
            "192.168.1.10:5678",
            "1",
            "node",
        );
        let p = parse(&buf[..n], 1).unwrap();
        assert_eq!(p.method, Method::Notify);
        assert_eq!(p.st, "ST_P2P");
        assert_eq!(p.usn, "nodeX");
        assert_eq!(p.location, "192.168.1.10:5678");
        assert_eq!(p.sm_id, "1");
        assert_eq!(p.device_type, "node");
    }

    #[test]
    fn build_response_round_trips_recognized_fields() {
        let mut buf = [0u8; 512];
        let n = build_response(
            &mut buf,
            "ST_P2P",
            "nodeX",
            "192.168.1.10:5678",
            "1",
            "node",
        );
        let p = parse(&buf[..n], 1).unwrap();
        assert_eq!(p.method, Method::Response);
        assert_eq!(p.st, "ST_P2P");
        assert_eq!(p.location, "192.168.1.10:5678");
    }

    #[test]
    fn too_small_buffer_fails_to_write_but_does_not_panic() {
        let mut buf = [0u8; 4];
        let n = build_msearch(&mut buf, 1900, "ST_P2P");
        assert_eq!(n, 0);
    }
}
