//! Boot keyboard reports and the endpoint they go out on.

use usbd_hid::descriptor::KeyboardReport;

use crate::{Keycode, Result};

/// A report holding down `keycode` alone.
pub fn held(keycode: Keycode) -> KeyboardReport {
    KeyboardReport {
        modifier: 0,
        reserved: 0,
        leds: 0,
        keycodes: [keycode.code(), 0, 0, 0, 0, 0],
    }
}

/// A report with every key up.
pub fn released() -> KeyboardReport {
    KeyboardReport::default()
}

/// Where keyboard reports are sent, normally the HID IN endpoint.
pub trait ReportSink {
    /// Whether a report submitted now would be accepted.
    fn is_ready(&self) -> bool;

    /// Push one report. Best effort: callers may retry on error but the
    /// sequencer does not.
    fn submit(&mut self, report: &KeyboardReport) -> Result<()>;
}

impl<T: ReportSink + ?Sized> ReportSink for &mut T {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn submit(&mut self, report: &KeyboardReport) -> Result<()> {
        (**self).submit(report)
    }
}
