//! Serial alphabet to keypad keycodes.

use core::fmt;

use crate::Keycode;

/// ASCII backspace as sent by most terminals with `stty erase ^H`.
pub const BACKSPACE: u8 = 0x08;

/// Map one received byte to the key it should press, if any.
pub fn translate(byte: u8) -> Option<Keycode> {
    let keycode = match byte {
        b'0' => Keycode::KEYPAD_0,
        b'1' => Keycode::KEYPAD_1,
        b'2' => Keycode::KEYPAD_2,
        b'3' => Keycode::KEYPAD_3,
        b'4' => Keycode::KEYPAD_4,
        b'5' => Keycode::KEYPAD_5,
        b'6' => Keycode::KEYPAD_6,
        b'7' => Keycode::KEYPAD_7,
        b'8' => Keycode::KEYPAD_8,
        b'9' => Keycode::KEYPAD_9,
        b'*' => Keycode::KEYPAD_ASTERISK,
        b'/' => Keycode::KEYPAD_SLASH,
        b'-' => Keycode::KEYPAD_MINUS,
        b'+' => Keycode::KEYPAD_PLUS,
        BACKSPACE => Keycode::BACKSPACE,
        b'\r' | b'\n' => Keycode::KEYPAD_ENTER,
        _ => return None,
    };

    Some(keycode)
}

/// How a byte is shown in the diagnostic line.
pub fn printable(byte: u8) -> char {
    match byte {
        0x20..=0x7E => byte as char,
        _ => '.',
    }
}

/// One byte taken off the serial line and what it turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    pub byte: u8,
    pub keycode: Option<Keycode>,
}

impl Received {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            byte,
            keycode: translate(byte),
        }
    }

    /// The byte written straight back to the sender.
    pub fn echo(&self) -> u8 {
        self.byte
    }

    pub fn dispatched(&self) -> bool {
        self.keycode.is_some()
    }
}

/// Renders the diagnostic line, terminator included.
impl fmt::Display for Received {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Received character 0x{:02X} ('{}') from UART, send HID {}\r\n",
            self.byte,
            printable(self.byte),
            if self.dispatched() { "YES" } else { "NO" }
        )
    }
}
