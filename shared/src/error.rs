//! Error types

use core::fmt;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A scripted sequence does not fit in the playback buffer
    SequenceTooLong { len: usize, capacity: usize },
    /// The HID endpoint cannot take a report right now
    NotReady,
    /// The endpoint was busy when the report was pushed
    WouldBlock,
    /// The USB stack rejected the report
    Transport,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SequenceTooLong { len, capacity } => {
                write!(f, "sequence of {len} keys exceeds capacity of {capacity}")
            }
            Error::NotReady => write!(f, "HID endpoint not ready"),
            Error::WouldBlock => write!(f, "HID endpoint busy"),
            Error::Transport => write!(f, "USB transport error"),
        }
    }
}
