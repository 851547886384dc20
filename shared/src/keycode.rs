use usbd_hid::descriptor::KeyboardUsage;

/// A usage id from the HID keyboard/keypad page.
///
/// Nothing here checks that the value names a real key, it is handed to the
/// host as-is.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Keycode(u8);

impl Keycode {
    /// The value of an unused report slot.
    pub const NONE: Keycode = Keycode(0x00);

    pub const KEYPAD_0: Keycode = Keycode(0x62);
    pub const KEYPAD_1: Keycode = Keycode(0x59);
    pub const KEYPAD_2: Keycode = Keycode(0x5A);
    pub const KEYPAD_3: Keycode = Keycode(0x5B);
    pub const KEYPAD_4: Keycode = Keycode(0x5C);
    pub const KEYPAD_5: Keycode = Keycode(0x5D);
    pub const KEYPAD_6: Keycode = Keycode(0x5E);
    pub const KEYPAD_7: Keycode = Keycode(0x5F);
    pub const KEYPAD_8: Keycode = Keycode(0x60);
    pub const KEYPAD_9: Keycode = Keycode(0x61);
    pub const KEYPAD_ASTERISK: Keycode = Keycode(0x55);
    pub const KEYPAD_SLASH: Keycode = Keycode(0x54);
    pub const KEYPAD_MINUS: Keycode = Keycode(0x56);
    pub const KEYPAD_PLUS: Keycode = Keycode(0x57);
    pub const KEYPAD_ENTER: Keycode = Keycode(0x58);
    /// The main-block backspace, not a keypad key.
    pub const BACKSPACE: Keycode = Keycode(0x2A);

    pub const fn new(code: u8) -> Self {
        Keycode(code)
    }

    pub const fn code(self) -> u8 {
        self.0
    }
}

impl From<KeyboardUsage> for Keycode {
    fn from(usage: KeyboardUsage) -> Self {
        Keycode(usage as u8)
    }
}

impl From<u8> for Keycode {
    fn from(code: u8) -> Self {
        Keycode(code)
    }
}

impl From<Keycode> for u8 {
    fn from(keycode: Keycode) -> Self {
        keycode.0
    }
}
