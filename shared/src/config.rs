//! Serial line settings.
//!
//! The line is never negotiated: both ends are built or invoked with the
//! same constants.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineConfig {
    pub baud: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
}

impl LineConfig {
    /// 9600 8N1
    pub const CANONICAL: LineConfig = LineConfig {
        baud: 9600,
        data_bits: 8,
        parity: Parity::None,
        stop_bits: 1,
    };

    /// 115200 8N1
    pub const FAST: LineConfig = LineConfig {
        baud: 115_200,
        ..LineConfig::CANONICAL
    };
}

impl Default for LineConfig {
    fn default() -> Self {
        LineConfig::CANONICAL
    }
}

impl fmt::Display for LineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
        };
        write!(
            f,
            "{} {}{}{}",
            self.baud, self.data_bits, parity, self.stop_bits
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_is_default() {
        assert_eq!(LineConfig::default(), LineConfig::CANONICAL);
        assert_eq!(LineConfig::CANONICAL.to_string(), "9600 8N1");
    }

    #[test]
    fn test_fast_only_changes_baud() {
        assert_eq!(LineConfig::FAST.baud, 115_200);
        assert_eq!(LineConfig::FAST.data_bits, 8);
        assert_eq!(LineConfig::FAST.parity, Parity::None);
        assert_eq!(LineConfig::FAST.to_string(), "115200 8N1");
    }
}
