use heapless::Vec;

use crate::{Error, Keycode, Result};

/// The most keys one playback can hold.
pub const MAX_SEQUENCE_LEN: usize = 32;

const _: () = assert!(MAX_SEQUENCE_LEN > 0);

/// Keys played back in order, one press/release pair each.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Sequence {
    keys: Vec<Keycode, MAX_SEQUENCE_LEN>,
}

impl Sequence {
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    pub fn single(keycode: Keycode) -> Self {
        let mut keys = Vec::new();
        keys.push(keycode).ok();
        Self { keys }
    }

    pub fn from_slice(keys: &[Keycode]) -> Result<Self> {
        let keys = Vec::from_slice(keys).map_err(|_| Error::SequenceTooLong {
            len: keys.len(),
            capacity: MAX_SEQUENCE_LEN,
        })?;
        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Keycode> {
        self.keys.get(index).copied()
    }

    pub fn as_slice(&self) -> &[Keycode] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single() {
        let seq = Sequence::single(Keycode::KEYPAD_5);
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.get(0), Some(Keycode::KEYPAD_5));
        assert_eq!(seq.get(1), None);
    }

    #[test]
    fn test_from_slice_at_capacity() {
        let keys = [Keycode::KEYPAD_1; MAX_SEQUENCE_LEN];
        let seq = Sequence::from_slice(&keys).unwrap();
        assert_eq!(seq.len(), MAX_SEQUENCE_LEN);
        assert_eq!(seq.as_slice(), &keys[..]);
    }

    #[test]
    fn test_from_slice_too_long() {
        let keys = [Keycode::KEYPAD_1; MAX_SEQUENCE_LEN + 1];
        assert_eq!(
            Sequence::from_slice(&keys),
            Err(Error::SequenceTooLong {
                len: MAX_SEQUENCE_LEN + 1,
                capacity: MAX_SEQUENCE_LEN
            })
        );
    }

    #[test]
    fn test_empty() {
        let seq = Sequence::from_slice(&[]).unwrap();
        assert!(seq.is_empty());
        assert_eq!(seq, Sequence::new());
    }
}
