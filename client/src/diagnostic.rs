//! Picking the bridge's diagnostic lines out of its serial output.
//!
//! The bridge writes the echoed byte and then a line of the form
//! `Received character 0x35 ('5') from UART, send HID YES\r\n`, so a line
//! read from the port may start with one stray echo byte.

const PREFIX: &str = "Received character 0x";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub byte: u8,
    pub dispatched: bool,
    pub line: String,
}

/// Parse one `\n` terminated chunk of port output.
pub fn parse(raw: &[u8]) -> Option<Diagnostic> {
    let text = String::from_utf8_lossy(raw);
    let start = text.find(PREFIX)?;
    let line = text[start..].trim_end().to_owned();

    let hex = line.get(PREFIX.len()..PREFIX.len() + 2)?;
    let byte = u8::from_str_radix(hex, 16).ok()?;
    let dispatched = if line.ends_with("send HID YES") {
        true
    } else if line.ends_with("send HID NO") {
        false
    } else {
        return None;
    };

    Some(Diagnostic {
        byte,
        dispatched,
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uart_hid_shared::Received;

    #[test]
    fn test_parse_with_echo() {
        let diag = parse(b"5Received character 0x35 ('5') from UART, send HID YES\r\n").unwrap();
        assert_eq!(diag.byte, b'5');
        assert!(diag.dispatched);
        assert_eq!(
            diag.line,
            "Received character 0x35 ('5') from UART, send HID YES"
        );
    }

    #[test]
    fn test_parse_unmapped() {
        let diag = parse(b"xReceived character 0x78 ('x') from UART, send HID NO\r\n").unwrap();
        assert_eq!(diag.byte, b'x');
        assert!(!diag.dispatched);
    }

    #[test]
    fn test_echoed_newline_is_not_a_line() {
        assert_eq!(parse(b"\n"), None);
        assert_eq!(parse(b"\r\n"), None);
        assert_eq!(parse(b"garbage\r\n"), None);
    }

    #[test]
    fn test_parses_what_the_bridge_writes() {
        for byte in [b'0', b'+', 0x08, b'\r', b'z', 0xC3] {
            let received = Received::from_byte(byte);
            let mut raw = vec![received.echo()];
            raw.extend_from_slice(received.to_string().as_bytes());
            let diag = parse(&raw).unwrap();
            assert_eq!(diag.byte, byte);
            assert_eq!(diag.dispatched, received.dispatched());
        }
    }
}
