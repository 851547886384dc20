//! Keystroke playback.
//!
//! A HID keyboard reports which keys are down, not key events, so every
//! keystroke is a "held" report followed by a "released" report at least
//! [`HOLD_TIME_MS`] later. [`Sequencer::step`] is called once per control
//! loop iteration and never blocks: waiting is the state machine staying put
//! until the clock or the endpoint lets it move on.
//!
//! Time is a free-running millisecond counter supplied by the caller. Only
//! differences are taken, with wrapping arithmetic, so the counter may roll
//! over.

use usbd_hid::descriptor::KeyboardReport;

use crate::report::{self, ReportSink};
use crate::{Keycode, Result, Sequence};

/// Minimum time a key stays down before it is released.
pub const HOLD_TIME_MS: u32 = 100;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// Nothing to play
    #[default]
    Idle,
    /// The key under the cursor goes down on the next ready step
    Press,
    /// The key under the cursor is down, waiting out the hold time
    Release,
}

#[derive(Debug, Default)]
pub struct Sequencer {
    sequence: Sequence,
    cursor: usize,
    state: SequencerState,
    since: u32,
    held: u32,
    released: u32,
}

impl Sequencer {
    pub const fn new() -> Self {
        Self {
            sequence: Sequence::new(),
            cursor: 0,
            state: SequencerState::Idle,
            since: 0,
            held: 0,
            released: 0,
        }
    }

    /// Begin playing `sequence`, dropping whatever was in flight.
    ///
    /// If a key is currently down no release is sent for it here; the next
    /// held report simply replaces it on the host.
    pub fn start(&mut self, sequence: Sequence, now: u32) {
        if self.state != SequencerState::Idle && self.cursor < self.sequence.len() {
            log::debug!(
                "preempting playback at key {}/{}",
                self.cursor,
                self.sequence.len()
            );
        }

        self.sequence = sequence;
        self.cursor = 0;
        self.state = SequencerState::Press;
        self.since = now;
    }

    pub fn start_single(&mut self, keycode: Keycode, now: u32) {
        self.start(Sequence::single(keycode), now);
    }

    /// Start a scripted sequence. Too long a script leaves the current
    /// playback alone.
    pub fn start_slice(&mut self, keys: &[Keycode], now: u32) -> Result<()> {
        let sequence = Sequence::from_slice(keys)?;
        self.start(sequence, now);
        Ok(())
    }

    /// Advance by at most one transition.
    pub fn step<S: ReportSink>(&mut self, now: u32, mut sink: S) {
        debug_assert!(self.cursor <= self.sequence.len());

        if !sink.is_ready() {
            return;
        }

        match self.state {
            SequencerState::Idle => {}
            SequencerState::Press => match self.sequence.get(self.cursor) {
                Some(keycode) => {
                    log::trace!("press {:#04x}", keycode.code());
                    submit(&mut sink, &report::held(keycode));
                    self.held = self.held.wrapping_add(1);
                    self.state = SequencerState::Release;
                    self.since = now;
                }
                None => {
                    log::debug!(
                        "sequence of {} done, {} held / {} released since boot",
                        self.sequence.len(),
                        self.held,
                        self.released
                    );
                    self.state = SequencerState::Idle;
                }
            },
            SequencerState::Release => {
                if now.wrapping_sub(self.since) < HOLD_TIME_MS {
                    return;
                }

                log::trace!("release after {}ms", now.wrapping_sub(self.since));
                submit(&mut sink, &report::released());
                self.released = self.released.wrapping_add(1);
                self.cursor += 1;
                self.state = SequencerState::Press;
                self.since = now;
            }
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn is_idle(&self) -> bool {
        self.state == SequencerState::Idle
    }

    /// Whether a held report is out without its release yet.
    pub fn is_key_down(&self) -> bool {
        self.state == SequencerState::Release
    }

    /// Held and released reports pushed since boot.
    pub fn reports_emitted(&self) -> (u32, u32) {
        (self.held, self.released)
    }
}

// Results are not acted on: a lost report is not resent.
fn submit<S: ReportSink>(sink: &mut S, report: &KeyboardReport) {
    if let Err(e) = sink.submit(report) {
        log::warn!("report dropped: {}", e);
    }
}
