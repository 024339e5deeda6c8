use core::convert::TryFrom;

use embedded_hal::can::{ExtendedId, Id, StandardId};
use modular_bitfield::prelude::*;

use crate::{regs::Register, stat::Interrupts};

/// Identifier register group: `SIDH`, `SIDL`, `EID8` and `EID0`.
///
/// The bitfield is laid out LSB first, so its byte order is the reverse of
/// the register address order. Use [`IdentRegs::from_registers`] and
/// [`IdentRegs::into_registers`] to move between the two.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentRegs {
    /// Extended identifier bits 17..0.
    pub eid: B18,
    #[skip]
    __: B1,
    /// Extended identifier enable.
    pub exide: bool,
    // SRR on receive buffers.
    #[skip]
    __: B1,
    /// Standard identifier, or identifier bits 28..18 of an extended frame.
    pub sid: B11,
}

impl IdentRegs {
    /// Builds the register group from bytes read in address order (`SIDH`
    /// first).
    pub fn from_registers(regs: [u8; 4]) -> Self {
        let [sidh, sidl, eid8, eid0] = regs;
        Self::from_bytes([eid0, eid8, sidl, sidh])
    }

    /// Returns the register contents in address order (`SIDH` first).
    pub fn into_registers(self) -> [u8; 4] {
        let [eid0, eid8, sidl, sidh] = self.into_bytes();
        [sidh, sidl, eid8, eid0]
    }

    /// Creates the register group for a CAN bus ID.
    pub fn from_id(id: Id) -> Self {
        // In standard mode: `exide == false` and `eid` doesn't matter. The ID goes
        // into `sid`.
        // In extended mode: `exide == true` and the lower 18 bits of the ID go into
        // `eid`. The rest (upper 11 bits) go into `sid`.
        match id {
            Id::Standard(id) => IdentRegs::new()
                .with_exide(false)
                .with_eid(0)
                .with_sid(id.as_raw()),
            Id::Extended(id) => IdentRegs::new()
                .with_exide(true)
                .with_eid(id.as_raw() & 0x3FFFF)
                .with_sid((id.as_raw() >> 18) as u16),
        }
    }

    /// Reconstructs the CAN bus ID held by the register group.
    pub fn id(&self) -> Id {
        if self.exide() {
            let raw = u32::from(self.sid()) << 18 | self.eid();
            Id::Extended(ExtendedId::new(raw).unwrap_or(ExtendedId::ZERO))
        } else {
            Id::Standard(StandardId::new(self.sid()).unwrap_or(StandardId::ZERO))
        }
    }
}

/// Mask of the data length code bits in a `DLC` register.
pub const DLC_MASK: u8 = 0x0F;

crate::buffer_def! {
    /// Receive buffer.
    RxBuf => {
        /// Rx buffer 0.
        B0 => Register::RXB0SIDH,
        /// Rx buffer 1.
        B1 => Register::RXB1SIDH
    }
}

impl RxBuf {
    /// Returns the `CTRL` register for the selected Rx buffer.
    pub const fn ctrl(self) -> Register {
        match self {
            RxBuf::B0 => Register::RXB0CTRL,
            RxBuf::B1 => Register::RXB1CTRL,
        }
    }

    /// Returns the `DATA` register for the selected Rx buffer.
    pub const fn data(self) -> Register {
        match self {
            RxBuf::B0 => Register::RXB0DATA,
            RxBuf::B1 => Register::RXB1DATA,
        }
    }

    /// Returns the `CANINTF` flag raised when the buffer is full.
    pub const fn interrupt(self) -> Interrupts {
        match self {
            RxBuf::B0 => Interrupts::RX0,
            RxBuf::B1 => Interrupts::RX1,
        }
    }
}

crate::buffer_def! {
    /// Transmit buffer.
    TxBuf => {
        /// Tx buffer 0.
        B0 => Register::TXB0SIDH,
        /// Tx buffer 1.
        B1 => Register::TXB1SIDH,
        /// Tx buffer 2.
        B2 => Register::TXB2SIDH
    }
}

impl TxBuf {
    /// Returns the `CTRL` register for the selected Tx buffer.
    pub const fn ctrl(self) -> Register {
        match self {
            TxBuf::B0 => Register::TXB0CTRL,
            TxBuf::B1 => Register::TXB1CTRL,
            TxBuf::B2 => Register::TXB2CTRL,
        }
    }

    /// Returns the `DLC` register for the selected Tx buffer.
    pub const fn dlc(self) -> Register {
        match self {
            TxBuf::B0 => Register::TXB0DLC,
            TxBuf::B1 => Register::TXB1DLC,
            TxBuf::B2 => Register::TXB2DLC,
        }
    }

    /// Returns the `DATA` register for the selected Tx buffer.
    pub const fn data(self) -> Register {
        match self {
            TxBuf::B0 => Register::TXB0DATA,
            TxBuf::B1 => Register::TXB1DATA,
            TxBuf::B2 => Register::TXB2DATA,
        }
    }
}

impl TryFrom<u8> for TxBuf {
    /// The rejected index.
    type Error = u8;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(TxBuf::B0),
            1 => Ok(TxBuf::B1),
            2 => Ok(TxBuf::B2),
            n => Err(n),
        }
    }
}
