use core::convert::TryFrom;

use embedded_hal::can::{ExtendedId, Frame, Id, StandardId};

/// Flag set in [`CanFrame::raw_id`] for frames with a 29-bit identifier.
pub const EFF_FLAG: u32 = 0x8000_0000;
/// Flag set in [`CanFrame::raw_id`] for remote transmission requests.
pub const RTR_FLAG: u32 = 0x4000_0000;

/// CAN frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    /// ID of CAN frame.
    pub(crate) id: Id,
    /// Whether the frame is an RTR frame.
    pub(crate) rtr: bool,
    /// Length of data in CAN frame.
    pub(crate) dlc: u8,
    /// Data, maximum 8 bytes.
    pub(crate) data: [u8; 8],
}

impl CanFrame {
    /// Returns the identifier packed into a single integer: the 11 or 29
    /// identifier bits, plus [`EFF_FLAG`] for extended frames and
    /// [`RTR_FLAG`] for remote frames.
    pub fn raw_id(&self) -> u32 {
        let mut raw = match self.id {
            Id::Standard(id) => u32::from(id.as_raw()),
            Id::Extended(id) => id.as_raw() | EFF_FLAG,
        };
        if self.rtr {
            raw |= RTR_FLAG;
        }
        raw
    }

    /// Creates a frame from an identifier packed as by [`CanFrame::raw_id`].
    ///
    /// Returns `None` if any bit besides the flags and the 11 or 29
    /// identifier bits is set, or if `data` is longer than 8 bytes. For
    /// remote frames only the length of `data` is used, as the DLC.
    pub fn from_raw_id(raw: u32, data: &[u8]) -> Option<Self> {
        let bits = raw & !(EFF_FLAG | RTR_FLAG);
        let id: Id = if raw & EFF_FLAG != 0 {
            ExtendedId::new(bits)?.into()
        } else {
            StandardId::new(u16::try_from(bits).ok()?)?.into()
        };
        if raw & RTR_FLAG != 0 {
            Self::new_remote(id, data.len())
        } else {
            Self::new(id, data)
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CanFrame {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "CanFrame {{ id: {:#X}, dlc: {:#X}, data: {:#X} }}",
            self.raw_id(),
            self.dlc,
            self.data()
        );
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let mut frame = CanFrame {
            id: id.into(),
            rtr: false,
            dlc: data.len() as u8, // Already asserted data.len() <= 8
            data: [0; 8],
        };
        frame.data[..data.len()].copy_from_slice(data);
        Some(frame)
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > 8 {
            return None;
        }
        Some(CanFrame {
            id: id.into(),
            rtr: true,
            dlc: dlc as u8, // Already asserted dlc <= 8
            data: [0; 8],
        })
    }

    #[inline]
    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    #[inline]
    fn is_remote_frame(&self) -> bool {
        self.rtr
    }

    #[inline]
    fn id(&self) -> Id {
        self.id
    }

    #[inline]
    fn dlc(&self) -> usize {
        self.dlc as usize
    }

    #[inline]
    fn data(&self) -> &[u8] {
        &self.data[..self.dlc()]
    }
}
