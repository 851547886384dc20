//! One iteration of the UART to HID control loop.
//!
//! The owner calls [`Bridge::on_byte`] for every byte taken off the serial
//! line and then [`Bridge::poll`] once, so a byte received in an iteration
//! can preempt playback before that iteration's step.

use core::fmt::Write as _;

use heapless::String;

use crate::report::ReportSink;
use crate::translate::Received;
use crate::Sequencer;

/// Longest diagnostic line is 55 bytes.
const LINE_CAPACITY: usize = 64;

/// The transmit half of the serial channel.
pub trait SerialOut {
    /// Queue bytes for transmission without waiting for the wire.
    fn write_bytes(&mut self, bytes: &[u8]);
}

impl<T: SerialOut + ?Sized> SerialOut for &mut T {
    fn write_bytes(&mut self, bytes: &[u8]) {
        (**self).write_bytes(bytes)
    }
}

#[derive(Debug, Default)]
pub struct Bridge {
    sequencer: Sequencer,
}

impl Bridge {
    pub const fn new() -> Self {
        Self {
            sequencer: Sequencer::new(),
        }
    }

    /// Echo `byte`, report what it mapped to, and start its keystroke.
    pub fn on_byte<O: SerialOut>(&mut self, byte: u8, now: u32, mut serial: O) -> Received {
        let received = Received::from_byte(byte);

        serial.write_bytes(&[received.echo()]);

        let mut line: String<LINE_CAPACITY> = String::new();
        if write!(line, "{received}").is_err() {
            log::warn!("diagnostic line truncated for {:#04x}", byte);
        }
        serial.write_bytes(line.as_bytes());

        match received.keycode {
            Some(keycode) => self.sequencer.start_single(keycode, now),
            None => log::debug!("no key for {:#04x}", byte),
        }

        received
    }

    pub fn poll<S: ReportSink>(&mut self, now: u32, sink: S) {
        self.sequencer.step(now, sink);
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Keycode, Result, SequencerState, HOLD_TIME_MS};
    use std::vec::Vec;
    use usbd_hid::descriptor::KeyboardReport;

    #[derive(Default)]
    struct Wire(Vec<u8>);

    impl SerialOut for Wire {
        fn write_bytes(&mut self, bytes: &[u8]) {
            self.0.extend_from_slice(bytes);
        }
    }

    #[derive(Default)]
    struct Host {
        suspended: bool,
        reports: Vec<(u32, [u8; 6])>,
        clock: u32,
    }

    impl ReportSink for Host {
        fn is_ready(&self) -> bool {
            !self.suspended
        }

        fn submit(&mut self, report: &KeyboardReport) -> Result<()> {
            if self.suspended {
                return Err(Error::NotReady);
            }
            self.reports.push((self.clock, report.keycodes));
            Ok(())
        }
    }

    /// Run iterations 1ms apart, feeding `input` at the given times.
    fn run(bridge: &mut Bridge, host: &mut Host, wire: &mut Wire, input: &[(u32, u8)], until: u32) {
        for now in 0..until {
            for &(_, byte) in input.iter().filter(|(at, _)| *at == now) {
                bridge.on_byte(byte, now, &mut *wire);
            }
            host.clock = now;
            bridge.poll(now, &mut *host);
        }
    }

    #[test]
    fn test_mapped_byte_while_idle() {
        let mut bridge = Bridge::new();
        let mut host = Host::default();
        let mut wire = Wire::default();

        run(&mut bridge, &mut host, &mut wire, &[(10, b'5')], 300);

        let expected = b"5Received character 0x35 ('5') from UART, send HID YES\r\n";
        assert_eq!(wire.0, expected);
        assert_eq!(host.reports.len(), 2);

        let (pressed, down) = host.reports[0];
        assert_eq!(pressed, 10);
        assert_eq!(down, [0x5D, 0, 0, 0, 0, 0]);

        let (released, up) = host.reports[1];
        assert_eq!(up, [0; 6]);
        assert!(released - pressed >= HOLD_TIME_MS);

        assert!(bridge.sequencer().is_idle());
    }

    #[test]
    fn test_unmapped_byte() {
        let mut bridge = Bridge::new();
        let mut host = Host::default();
        let mut wire = Wire::default();

        let received = bridge.on_byte(b'x', 0, &mut wire);
        assert!(!received.dispatched());
        assert_eq!(
            wire.0,
            b"xReceived character 0x78 ('x') from UART, send HID NO\r\n"
        );

        bridge.poll(0, &mut host);
        assert_eq!(bridge.sequencer().state(), SequencerState::Idle);
        assert!(host.reports.is_empty());
    }

    #[test]
    fn test_unmapped_byte_does_not_disturb_playback() {
        let mut bridge = Bridge::new();
        let mut host = Host::default();
        let mut wire = Wire::default();

        run(&mut bridge, &mut host, &mut wire, &[(0, b'1'), (50, b'q')], 300);

        let keys: Vec<[u8; 6]> = host.reports.iter().map(|(_, r)| *r).collect();
        assert_eq!(keys, [[0x59, 0, 0, 0, 0, 0], [0; 6]]);
    }

    #[test]
    fn test_byte_preempts_same_iteration() {
        let mut bridge = Bridge::new();
        let mut host = Host::default();
        let mut wire = Wire::default();

        run(&mut bridge, &mut host, &mut wire, &[(0, b'1'), (40, b'2')], 400);

        let keys: Vec<(u32, [u8; 6])> = host.reports.clone();
        assert_eq!(keys[0], (0, [0x59, 0, 0, 0, 0, 0]));
        assert_eq!(keys[1], (40, [0x5A, 0, 0, 0, 0, 0]));
        assert_eq!(keys[2], (140, [0; 6]));
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_spaced_input_types_every_key() {
        let mut bridge = Bridge::new();
        let mut host = Host::default();
        let mut wire = Wire::default();

        let input: Vec<(u32, u8)> = b"12*3\r"
            .iter()
            .enumerate()
            .map(|(i, &b)| (i as u32 * 150, b))
            .collect();
        run(&mut bridge, &mut host, &mut wire, &input, 1000);

        let pressed: Vec<u8> = host
            .reports
            .iter()
            .map(|(_, r)| r[0])
            .filter(|&code| code != 0)
            .collect();
        assert_eq!(
            pressed,
            [
                Keycode::KEYPAD_1.code(),
                Keycode::KEYPAD_2.code(),
                Keycode::KEYPAD_ASTERISK.code(),
                Keycode::KEYPAD_3.code(),
                Keycode::KEYPAD_ENTER.code(),
            ]
        );
        assert_eq!(host.reports.len(), 10);
    }

    #[test]
    fn test_suspended_host_delays_press() {
        let mut bridge = Bridge::new();
        let mut host = Host {
            suspended: true,
            ..Default::default()
        };
        let mut wire = Wire::default();

        bridge.on_byte(b'\x08', 0, &mut wire);
        for now in 0..50 {
            bridge.poll(now, &mut host);
        }
        assert!(host.reports.is_empty());
        assert_eq!(bridge.sequencer().state(), SequencerState::Press);

        host.suspended = false;
        host.clock = 50;
        bridge.poll(50, &mut host);
        assert_eq!(host.reports, [(50, [0x2A, 0, 0, 0, 0, 0])]);
    }
}
