//! Local key events to bytes of the bridge's serial alphabet.

use evdev::Key;

use uart_hid_shared::translate::BACKSPACE;

/// The byte that makes the bridge press the same key, if there is one.
///
/// Top row digits and the main Enter are folded onto their keypad
/// counterparts since the bridge only types keypad keys.
pub fn key_to_byte(key: Key) -> Option<u8> {
    let byte = match key {
        Key::KEY_KP0 | Key::KEY_0 => b'0',
        Key::KEY_KP1 | Key::KEY_1 => b'1',
        Key::KEY_KP2 | Key::KEY_2 => b'2',
        Key::KEY_KP3 | Key::KEY_3 => b'3',
        Key::KEY_KP4 | Key::KEY_4 => b'4',
        Key::KEY_KP5 | Key::KEY_5 => b'5',
        Key::KEY_KP6 | Key::KEY_6 => b'6',
        Key::KEY_KP7 | Key::KEY_7 => b'7',
        Key::KEY_KP8 | Key::KEY_8 => b'8',
        Key::KEY_KP9 | Key::KEY_9 => b'9',
        Key::KEY_KPASTERISK => b'*',
        Key::KEY_KPSLASH | Key::KEY_SLASH => b'/',
        Key::KEY_KPMINUS | Key::KEY_MINUS => b'-',
        Key::KEY_KPPLUS => b'+',
        Key::KEY_BACKSPACE => BACKSPACE,
        Key::KEY_KPENTER | Key::KEY_ENTER => b'\r',
        _ => return None,
    };

    Some(byte)
}
