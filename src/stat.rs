//! Status and interrupt flag interpretation.

use bitflags::bitflags;
use modular_bitfield::prelude::*;

/// Byte returned by the `READ STATUS` instruction.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    #[skip(setters)]
    pub rx0if: bool,
    #[skip(setters)]
    pub rx1if: bool,
    #[skip(setters)]
    pub tx0req: bool,
    #[skip(setters)]
    pub tx0if: bool,
    #[skip(setters)]
    pub tx1req: bool,
    #[skip(setters)]
    pub tx1if: bool,
    #[skip(setters)]
    pub tx2req: bool,
    #[skip(setters)]
    pub tx2if: bool,
}

impl Status {
    /// Whether either receive buffer holds an unread frame.
    #[inline]
    pub fn frame_available(&self) -> bool {
        self.rx0if() || self.rx1if()
    }
}

bitflags! {
    /// Interrupt sources. The same layout is shared by `CANINTE` (armed
    /// sources) and `CANINTF` (pending flags).
    pub struct Interrupts: u8 {
        /// Receive buffer 0 full.
        const RX0 = 0b0000_0001;
        /// Receive buffer 1 full.
        const RX1 = 0b0000_0010;
        /// Transmit buffer 0 empty.
        const TX0 = 0b0000_0100;
        /// Transmit buffer 1 empty.
        const TX1 = 0b0000_1000;
        /// Transmit buffer 2 empty.
        const TX2 = 0b0001_0000;
        /// Error (any `EFLG` condition).
        const ERR = 0b0010_0000;
        /// Wake-up.
        const WAKE = 0b0100_0000;
        /// Message error.
        const MERR = 0b1000_0000;
    }
}

impl Default for Interrupts {
    fn default() -> Self {
        Interrupts::RX0 | Interrupts::RX1 | Interrupts::ERR | Interrupts::MERR | Interrupts::TX0
    }
}

bitflags! {
    /// Contents of the `EFLG` register.
    pub struct ErrorFlags: u8 {
        /// `TEC` or `REC` is at least 96.
        const EWARN = 0b0000_0001;
        /// `REC` is at least 96.
        const RXWAR = 0b0000_0010;
        /// `TEC` is at least 96.
        const TXWAR = 0b0000_0100;
        /// Receive error-passive.
        const RXEP = 0b0000_1000;
        /// Transmit error-passive.
        const TXEP = 0b0001_0000;
        /// Bus-off.
        const TXBO = 0b0010_0000;
        /// Receive buffer 0 overflowed.
        const RX0OVR = 0b0100_0000;
        /// Receive buffer 1 overflowed.
        const RX1OVR = 0b1000_0000;
    }
}

impl ErrorFlags {
    /// Whether the controller has disconnected from the bus.
    #[inline]
    pub fn is_bus_off(&self) -> bool {
        self.contains(ErrorFlags::TXBO)
    }
}
