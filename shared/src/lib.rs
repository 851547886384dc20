//! Keystroke playback for a UART driven USB HID keypad.
//!
//! Bytes from a serial line are looked up in a fixed alphabet, and each hit
//! is played to the host as a press/release pair of boot keyboard reports.
//! Nothing in here touches hardware: the firmware hands in a millisecond
//! clock, a [`ReportSink`] for the HID endpoint and a [`SerialOut`] for the
//! UART transmitter.

#![cfg_attr(not(test), no_std)]

pub mod bridge;
pub mod config;
pub mod error;
pub mod keycode;
pub mod report;
pub mod sequence;
pub mod sequencer;
pub mod translate;

pub use bridge::{Bridge, SerialOut};
pub use config::{LineConfig, Parity};
pub use error::{Error, Result};
pub use keycode::Keycode;
pub use report::ReportSink;
pub use sequence::{Sequence, MAX_SEQUENCE_LEN};
pub use sequencer::{Sequencer, SequencerState, HOLD_TIME_MS};
pub use translate::{translate, Received};
