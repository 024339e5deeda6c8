#![cfg_attr(not(test), no_std)]

//! Polled driver for the MCP2515 stand-alone CAN controller.
//!
//! The driver talks to the chip over SPI through the `embedded-hal` 0.2
//! [`Transfer`] trait and a chip-select [`OutputPin`]. Each register
//! operation is a single chip-select-qualified exchange. Frames are read by
//! polling ([`MCP2515::read_frame`], [`MCP2515::is_frame_available`]); the
//! `INT` pin is not used.
//!
//! Trace output goes through the [`log`] facade. Without a logger installed
//! nothing is emitted.

pub mod buffer;
pub mod error;
pub mod filter;
pub mod frame;
pub(crate) mod macros;
pub mod regs;
pub mod stat;
pub mod timing;

#[cfg(test)]
pub(crate) mod mocks;
#[cfg(test)]
mod tests;

use core::{convert::TryFrom, fmt::Debug};

use embedded_hal::{
    blocking::{delay::DelayMs, spi::Transfer},
    can::{Frame, Id},
    digital::v2::OutputPin,
};
use log::{debug, log_enabled, trace, Level};

use crate::{
    buffer::{IdentRegs, RxBuf, TxBuf, DLC_MASK},
    error::{ConfigureError, Error, Result, Unsupported},
    filter::{RxFilter, RxMask},
    frame::CanFrame,
    regs::{
        Bfpctrl, CanCtrl, CanStat, IntFlagCode, OpMode, RecvBufOpMode, Register, Rxb0Ctrl,
        Rxb1Ctrl, TxRtsCtrl, TxbCtrl,
    },
    stat::{ErrorFlags, Interrupts, Status},
    timing::BitTiming,
};

#[repr(u8)]
enum Instruction {
    Write = 0x2,
    Read = 0x3,
    Bitmod = 0x5,
    ReadStatus = 0xA0,
    Reset = 0xC0,
}

/// Size of the largest single SPI exchange.
const MAX_TRANSFER: usize = 16;
/// Instruction and address bytes preceding register data.
const HEADER_LEN: usize = 2;
/// Largest number of registers read or written in one exchange.
pub const MAX_REGISTER_RUN: usize = MAX_TRANSFER - HEADER_LEN;

/// Speed the CAN bus is operating at.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub enum CanSpeed {
    Kbps5,
    Kbps10,
    Kbps20,
    Kbps31_25,
    Kbps33_3,
    Kbps40,
    Kbps50,
    Kbps80,
    Kbps100,
    Kbps125,
    Kbps200,
    Kbps250,
    Kbps500,
    Kbps1000,
}

/// Speed the MCP2515 is operating at. Should match the crystal frequency
/// onboard.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub enum McpSpeed {
    MHz8,
    MHz16,
}

/// Source of the bit-timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timing {
    /// Explicit bit-timing parameters.
    Custom(BitTiming),
    /// Preset for a bus speed and oscillator. See [`BitTiming::preset`].
    Preset(CanSpeed, McpSpeed),
}

impl Default for Timing {
    fn default() -> Self {
        Timing::Custom(BitTiming::default())
    }
}

/// Function of the `RX0BF` and `RX1BF` pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxPinMode {
    /// Pins are high-impedance.
    Disabled,
    /// Each pin goes low when its receive buffer is full.
    BufferFull,
    /// Pins are digital outputs at the given levels.
    DigitalOutput { rx0bf: bool, rx1bf: bool },
}

impl RxPinMode {
    /// Returns the `BFPCTRL` value for this mode.
    pub fn register(self) -> Bfpctrl {
        match self {
            RxPinMode::Disabled => Bfpctrl::new(),
            RxPinMode::BufferFull => Bfpctrl::new()
                .with_b0bfe(true)
                .with_b1bfe(true)
                .with_b0bfm(true)
                .with_b1bfm(true),
            RxPinMode::DigitalOutput { rx0bf, rx1bf } => Bfpctrl::new()
                .with_b0bfe(true)
                .with_b1bfe(true)
                .with_b0bfs(rx0bf)
                .with_b1bfs(rx1bf),
        }
    }
}

/// Function of the `TX0RTS`, `TX1RTS` and `TX2RTS` pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub enum TxRtsPinMode {
    /// Pins are digital inputs.
    DigitalInput,
    /// A falling edge requests transmission of the matching buffer.
    RequestToSend,
}

impl TxRtsPinMode {
    /// Returns the `TXRTSCTRL` value for this mode.
    pub fn register(self) -> TxRtsCtrl {
        match self {
            TxRtsPinMode::DigitalInput => TxRtsCtrl::new(),
            TxRtsPinMode::RequestToSend => TxRtsCtrl::new()
                .with_b0rtsm(true)
                .with_b1rtsm(true)
                .with_b2rtsm(true),
        }
    }
}

/// Settings used to initialize the MCP2515.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Device operation mode once configuration has finished.
    pub mode: OpMode,
    /// Bit-timing configuration.
    pub timing: Timing,
    /// Interrupt sources enabled in `CANINTE`.
    pub interrupts: Interrupts,
    /// `RXnBF` pin function.
    pub rx_pins: RxPinMode,
    /// `TXnRTS` pin function.
    pub tx_rts_pins: TxRtsPinMode,
    /// Whether acceptance filters and masks are applied to received frames.
    /// When disabled every frame is received.
    pub filters_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: OpMode::Normal,
            timing: Timing::default(),
            interrupts: Interrupts::default(),
            rx_pins: RxPinMode::Disabled,
            tx_rts_pins: TxRtsPinMode::DigitalInput,
            filters_enabled: false,
        }
    }
}

/// MCP2515 driver.
pub struct MCP2515<SPI, CS> {
    /// SPI interface to interact with the MCP2515.
    spi: SPI,
    /// Chip select pin to select the MCP2515.
    cs: CS,
}

impl<SPI, CS, SPIE, CSE> MCP2515<SPI, CS>
where
    SPI: Transfer<u8, Error = SPIE>,
    CS: OutputPin<Error = CSE>,
    SPIE: Debug,
    CSE: Debug,
{
    /// Creates a new MCP2515 driver, resetting and configuring the chip in
    /// the process.
    ///
    /// The driver is only returned once the whole configuration sequence has
    /// succeeded. Invalid settings are rejected before the bus is touched.
    /// On failure the SPI interface and chip select pin are handed back in
    /// the [`ConfigureError`].
    ///
    /// # Configuration
    ///
    /// As this driver only takes ownership of the SPI interface, it is up to
    /// the user to create and configure the SPI interface. Namely, the MCP2515
    /// requires the following options:
    ///
    /// * **Data Order**: MSB first.
    /// * **Clock**: Check with your MCP2515 clock. Most breakout boards have an
    ///   8 MHz or 16 MHz oscillator on board. Half of the system clock rate is
    ///   good.
    /// * **Mode**: Mode 0.
    ///
    /// # Parameters
    ///
    /// * `spi` - SPI interface.
    /// * `cs` - Chip-select pin for the MCP2515.
    /// * `delay` - Delay interface from downstream HAL, used after reset.
    /// * `settings` - Settings for MCP2515. See [`Settings`].
    pub fn new(
        spi: SPI,
        cs: CS,
        delay: &mut impl DelayMs<u8>,
        settings: Settings,
    ) -> core::result::Result<Self, ConfigureError<SPI, CS, SPIE, CSE>> {
        let timing = match settings.timing {
            Timing::Custom(timing) => Ok(timing),
            Timing::Preset(can_speed, mcp_speed) => BitTiming::preset(can_speed, mcp_speed)
                .ok_or(Error::InvalidConfiguration(can_speed, mcp_speed)),
        };
        let cnf = timing.and_then(|timing| timing.registers().map_err(Error::InvalidBitTiming));

        let mut mcp = Self { spi, cs };
        match cnf.and_then(|cnf| mcp.configure(delay, &settings, cnf)) {
            Ok(()) => Ok(mcp),
            Err(error) => Err(ConfigureError {
                error,
                spi: mcp.spi,
                cs: mcp.cs,
            }),
        }
    }

    /// Releases the SPI interface and chip select pin.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn configure(
        &mut self,
        delay: &mut impl DelayMs<u8>,
        settings: &Settings,
        (cnf1, cnf2, cnf3): (regs::Cnf1, regs::Cnf2, regs::Cnf3),
    ) -> Result<(), SPIE, CSE> {
        self.cs.set_high().map_err(Error::Hal)?;
        self.reset(delay)?;

        // The chip comes out of reset in configuration mode, but make sure.
        // A reserved OPMOD pattern is forced as well.
        let canstat: CanStat = self.read_register()?;
        if !matches!(canstat.opmod_or_err(), Ok(OpMode::Configuration)) {
            debug!("forcing configuration mode from {:#04X}", canstat.into_bytes()[0]);
            self.set_mode(OpMode::Configuration)?;
        }

        debug!(
            "CNF1={:#04X} CNF2={:#04X} CNF3={:#04X}",
            cnf1.into_bytes()[0],
            cnf2.into_bytes()[0],
            cnf3.into_bytes()[0]
        );
        self.write_register(cnf1)?;
        self.write_register(cnf2)?;
        self.write_register(cnf3)?;

        self.clear_filters_and_masks()?;
        self.clear_control_buffers()?;

        self.write_registers(Register::CANINTE, &[settings.interrupts.bits()])?;
        self.write_register(settings.rx_pins.register())?;
        self.write_register(settings.tx_rts_pins.register())?;

        if log_enabled!(Level::Trace) {
            self.trace_registers()?;
        }

        self.set_filters_enabled(settings.filters_enabled)?;
        self.set_mode(settings.mode)
    }

    /// Zeroes all acceptance filters (RXF0-RXF5) and both masks.
    fn clear_filters_and_masks(&mut self) -> Result<(), SPIE, CSE> {
        let zeros = [0u8; 12];
        self.write_registers(Register::RXF0SIDH, &zeros)?;
        self.write_registers(Register::RXF3SIDH, &zeros)?;
        self.write_registers(Register::RXM0SIDH, &zeros[..8])
    }

    /// Zeroes the control, identifier and data registers of all Tx buffers
    /// and the control registers of both Rx buffers.
    fn clear_control_buffers(&mut self) -> Result<(), SPIE, CSE> {
        // TXBnCTRL through TXBnD7.
        let zeros = [0u8; 13];
        for buf in TxBuf::ALL {
            self.write_registers(buf.ctrl(), &zeros)?;
        }
        self.write_registers(Register::RXB0CTRL, &[0])?;
        self.write_registers(Register::RXB1CTRL, &[0])
    }

    /// Logs the filter, mask and configuration register groups.
    fn trace_registers(&mut self) -> Result<(), SPIE, CSE> {
        let groups = [
            (Register::RXF0SIDH, 14),
            (Register::CANSTAT, 2),
            (Register::RXF3SIDH, 14),
            (Register::RXM0SIDH, 8),
            (Register::CNF3, 6),
        ];
        let mut values = [0u8; MAX_REGISTER_RUN];
        for (start, len) in groups.iter().copied() {
            self.read_registers(start, &mut values[..len])?;
            trace!("{:02X} ({:?}): {:02X?}", start as u8, start, &values[..len]);
        }
        Ok(())
    }

    /// Enables or disables acceptance filtering on both Rx buffers. Rollover
    /// from RXB0 into RXB1 is disabled either way.
    pub fn set_filters_enabled(&mut self, enabled: bool) -> Result<(), SPIE, CSE> {
        let rxm = if enabled {
            RecvBufOpMode::FilterOn
        } else {
            RecvBufOpMode::FilterOff
        };
        self.modify_register(
            Rxb0Ctrl::new().with_rxm(rxm).with_bukt(false),
            Rxb0Ctrl::MASK_RXM | Rxb0Ctrl::MASK_BUKT,
        )?;
        self.modify_register(Rxb1Ctrl::new().with_rxm(rxm), Rxb1Ctrl::MASK_RXM)
    }

    /// Sets a receive filter. Only takes effect in configuration mode.
    ///
    /// # Parameters
    ///
    /// * `filter` - The filter to action on.
    /// * `id` - The actual ID filter to apply to `filter`.
    pub fn set_filter(&mut self, filter: RxFilter, id: Id) -> Result<(), SPIE, CSE> {
        let data = IdentRegs::from_id(id).into_registers();
        self.write_registers(filter.sidh(), &data)
    }

    /// Sets a receive mask. Only takes effect in configuration mode.
    ///
    /// # Parameters
    ///
    /// * `mask` - The mask to action on.
    /// * `id` - The actual ID mask to apply to `mask`.
    pub fn set_mask(&mut self, mask: RxMask, id: Id) -> Result<(), SPIE, CSE> {
        // Masks have no EXIDE bit.
        let data = IdentRegs::from_id(id).with_exide(false).into_registers();
        self.write_registers(mask.sidh(), &data)
    }

    /// Reads the operation mode the chip is currently in.
    pub fn mode(&mut self) -> Result<OpMode, SPIE, CSE> {
        let canstat: CanStat = self.read_register()?;
        canstat
            .opmod_or_err()
            .map_err(|_| Error::UnknownMode(canstat.opmod_bits()))
    }

    /// Requests a new operation mode.
    ///
    /// Only the `REQOP` bits of `CANCTRL` are modified. The chip switches
    /// once pending activity allows it; poll [`MCP2515::mode`] to observe
    /// the change.
    ///
    /// # Parameters
    ///
    /// * `mode` - New device mode.
    pub fn set_mode(&mut self, mode: OpMode) -> Result<(), SPIE, CSE> {
        trace!("requesting mode {:?}", mode);
        self.modify_register(CanCtrl::new().with_reqop(mode), CanCtrl::MASK_REQOP)
    }

    /// Returns the highest priority pending interrupt from `CANSTAT`.
    pub fn interrupt_code(&mut self) -> Result<IntFlagCode, SPIE, CSE> {
        let canstat: CanStat = self.read_register()?;
        Ok(canstat.icod())
    }

    /// Whether either Rx buffer holds a frame. Does not modify any flags.
    pub fn is_frame_available(&mut self) -> Result<bool, SPIE, CSE> {
        Ok(self.read_status()?.frame_available())
    }

    /// Reads a frame from whichever Rx buffer holds one, RXB0 first.
    ///
    /// # Returns
    ///
    /// `None` if both Rx buffers are empty.
    pub fn read_frame(&mut self) -> Result<Option<CanFrame>, SPIE, CSE> {
        let status = self.read_status()?;
        if status.rx0if() {
            self.read_frame_from(RxBuf::B0).map(Some)
        } else if status.rx1if() {
            self.read_frame_from(RxBuf::B1).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads a frame from a specific Rx buffer and clears its interrupt
    /// flag.
    ///
    /// A data length code above 8 yields [`Error::CorruptFrame`] and leaves
    /// the flag set; use [`MCP2515::discard_frame`] to drop the frame.
    ///
    /// # Parameters
    ///
    /// * `buf` - Rx buffer to read from.
    pub fn read_frame_from(&mut self, buf: RxBuf) -> Result<CanFrame, SPIE, CSE> {
        trace!("reading frame from {:?}", buf);

        // SIDH, SIDL, EID8, EID0, DLC
        let mut header = [0u8; 5];
        self.read_registers(buf.sidh(), &mut header)?;
        trace!("{:?} header: {:02X?}", buf, header);
        let [sidh, sidl, eid8, eid0, dlc] = header;
        let ident = IdentRegs::from_registers([sidh, sidl, eid8, eid0]);

        let mut ctrl = [0u8; 1];
        self.read_registers(buf.ctrl(), &mut ctrl)?;
        let rtr = match buf {
            RxBuf::B0 => Rxb0Ctrl::from_bytes(ctrl).rxrtr(),
            RxBuf::B1 => Rxb1Ctrl::from_bytes(ctrl).rxrtr(),
        };

        let dlc = dlc & DLC_MASK;
        if dlc > 8 {
            debug!("{:?} reported a DLC of {}", buf, dlc);
            return Err(Error::CorruptFrame(dlc));
        }

        let mut data = [0u8; 8];
        if dlc > 0 {
            self.read_registers(buf.data(), &mut data[..dlc as usize])?;
        }

        self.clear_interrupts(buf.interrupt())?;

        Ok(CanFrame {
            id: ident.id(),
            rtr,
            dlc,
            data,
        })
    }

    /// Drops whatever frame is held in an Rx buffer by clearing its
    /// interrupt flag.
    pub fn discard_frame(&mut self, buf: RxBuf) -> Result<(), SPIE, CSE> {
        self.clear_interrupts(buf.interrupt())
    }

    /// Loads a frame into a Tx buffer and requests its transmission.
    ///
    /// # Parameters
    ///
    /// * `frame` - Frame to send. Must have a standard ID and carry data.
    /// * `index` - Tx buffer index, 0 to 2.
    pub fn write_frame(&mut self, frame: &CanFrame, index: u8) -> Result<(), SPIE, CSE> {
        let buf = TxBuf::try_from(index).map_err(Error::InvalidTxBuffer)?;
        self.write_frame_to(buf, frame)
    }

    /// Loads a frame into a specific Tx buffer and requests its
    /// transmission.
    pub fn write_frame_to(&mut self, buf: TxBuf, frame: &CanFrame) -> Result<(), SPIE, CSE> {
        Self::check_transmittable(frame)?;
        trace!("writing frame {:#X} to {:?}", frame.raw_id(), buf);

        let [sidh, sidl, eid8, eid0] = IdentRegs::from_id(frame.id()).into_registers();
        self.write_registers(buf.sidh(), &[sidh, sidl, eid8, eid0, frame.dlc])?;
        if frame.dlc > 0 {
            self.write_registers(buf.data(), frame.data())?;
        }

        // Set `txreq` bit in ctrl register.
        self.modify_register_addr(
            buf.ctrl(),
            TxbCtrl::MASK_TXREQ.into_bytes()[0],
            TxbCtrl::new().with_txreq(true).into_bytes()[0],
        )
    }

    /// Rejects frames the driver cannot encode, before any bus access.
    fn check_transmittable(frame: &CanFrame) -> Result<(), SPIE, CSE> {
        if frame.dlc > 8 {
            return Err(Error::PayloadTooLong(frame.dlc as usize));
        }
        if frame.is_extended() {
            return Err(Error::Unsupported(Unsupported::ExtendedTransmit));
        }
        if frame.is_remote_frame() {
            return Err(Error::Unsupported(Unsupported::RemoteTransmit));
        }
        Ok(())
    }

    /// Attempts to find a Tx buffer with no pending transmission.
    ///
    /// # Returns
    ///
    /// `None` if all Tx buffers are busy.
    pub fn find_free_tx_buf(&mut self) -> Result<Option<TxBuf>, SPIE, CSE> {
        for buffer in TxBuf::ALL {
            if !self.tx_status(buffer)?.txreq() {
                return Ok(Some(buffer));
            }
        }
        Ok(None)
    }

    /// Reads the `CTRL` register of a Tx buffer.
    pub fn tx_status(&mut self, buf: TxBuf) -> Result<TxbCtrl, SPIE, CSE> {
        let mut ctrl = [0u8; 1];
        self.read_registers(buf.ctrl(), &mut ctrl)?;
        Ok(TxbCtrl::from_bytes(ctrl))
    }

    /// Reads the pending interrupt flags (`CANINTF`).
    pub fn interrupt_flags(&mut self) -> Result<Interrupts, SPIE, CSE> {
        let mut intf = [0u8; 1];
        self.read_registers(Register::CANINTF, &mut intf)?;
        Ok(Interrupts::from_bits_truncate(intf[0]))
    }

    /// Clears the given interrupt flags, leaving all others untouched.
    pub fn clear_interrupts(&mut self, flags: Interrupts) -> Result<(), SPIE, CSE> {
        self.modify_register_addr(Register::CANINTF, flags.bits(), 0)
    }

    /// Reads the error flag register (`EFLG`).
    pub fn error_flags(&mut self) -> Result<ErrorFlags, SPIE, CSE> {
        let mut eflg = [0u8; 1];
        self.read_registers(Register::EFLG, &mut eflg)?;
        Ok(ErrorFlags::from_bits_truncate(eflg[0]))
    }

    /// Reads the transmit and receive error counters, in that order.
    pub fn error_counters(&mut self) -> Result<(u8, u8), SPIE, CSE> {
        let mut counters = [0u8; 2];
        self.read_registers(Register::TEC, &mut counters)?;
        Ok((counters[0], counters[1]))
    }

    /// Resets the MCP2515.
    pub fn reset(&mut self, delay: &mut impl DelayMs<u8>) -> Result<(), SPIE, CSE> {
        self.transfer(&mut [Instruction::Reset as u8])?;
        // Sleep for 5ms after reset - if the device is in sleep mode it won't respond
        // immediately
        delay.delay_ms(5);

        Ok(())
    }

    /// Reads the status byte with the `READ STATUS` instruction.
    pub fn read_status(&mut self) -> Result<Status, SPIE, CSE> {
        let mut data = [Instruction::ReadStatus as u8, 0];
        let received = self.transfer(&mut data)?;
        let status = received
            .get(1)
            .copied()
            .ok_or(Error::ShortResponse(received.len()))?;
        Ok(Status::from_bytes([status]))
    }

    /// Read a register via a register object.
    #[inline]
    pub fn read_register<const N: usize, R: regs::Reg<N>>(&mut self) -> Result<R, SPIE, CSE> {
        let mut ret = [0u8; N];
        self.read_registers(R::ADDRESSES[0], &mut ret)?;
        Ok(R::read(ret))
    }

    /// Reads registers starting from `start` sequentially, moving on to the
    /// next register until `ret` is full.
    ///
    /// # Parameters
    ///
    /// * `start` - Register to start reading from.
    /// * `ret` - Return slice to write into. At most [`MAX_REGISTER_RUN`]
    ///   bytes.
    pub fn read_registers(&mut self, start: Register, ret: &mut [u8]) -> Result<(), SPIE, CSE> {
        let len = ret.len();
        if len > MAX_REGISTER_RUN {
            return Err(Error::TransferTooLong(len));
        }

        // As the MCP2515 doesn't care what we send it while reading, the bytes
        // after the header are just placeholders.
        let mut buf = [0u8; MAX_TRANSFER];
        buf[0] = Instruction::Read as u8;
        buf[1] = start as u8;
        let received = self.transfer(&mut buf[..HEADER_LEN + len])?;
        if received.len() < HEADER_LEN + len {
            return Err(Error::ShortResponse(received.len()));
        }
        ret.copy_from_slice(&received[HEADER_LEN..HEADER_LEN + len]);
        Ok(())
    }

    /// Write to a register using a register object.
    #[inline]
    pub fn write_register<const N: usize, R: regs::Reg<N>>(
        &mut self,
        reg: R,
    ) -> Result<(), SPIE, CSE> {
        self.write_registers(R::ADDRESSES[0], &reg.write())
    }

    /// Writes to sequential registers. Writing will start at `start` and
    /// continue sequentially until `data` is empty.
    ///
    /// `data` may hold at most [`MAX_REGISTER_RUN`] bytes.
    pub fn write_registers(&mut self, start: Register, data: &[u8]) -> Result<(), SPIE, CSE> {
        let len = data.len();
        if len > MAX_REGISTER_RUN {
            return Err(Error::TransferTooLong(len));
        }

        let mut buf = [0u8; MAX_TRANSFER];
        buf[0] = Instruction::Write as u8;
        buf[1] = start as u8;
        buf[HEADER_LEN..HEADER_LEN + len].copy_from_slice(data);
        self.transfer(&mut buf[..HEADER_LEN + len])?;
        Ok(())
    }

    /// Modifies a register.
    ///
    /// # Parameters
    ///
    /// * `reg` - New register content.
    /// * `mask` - Mask register. The bits must be 1 in the positions you want
    ///   to modify.
    #[inline]
    pub fn modify_register<const N: usize, R: regs::BitModifiable<N>>(
        &mut self,
        reg: R,
        mask: R,
    ) -> Result<(), SPIE, CSE> {
        let mask = mask.write();
        let reg = reg.write();
        for i in 0..N {
            self.modify_register_addr(R::ADDRESSES[i], mask[i], reg[i])?;
        }
        Ok(())
    }

    /// Modifies the bits of `reg` selected by `mask` using the `BIT MODIFY`
    /// instruction. The chip performs the read-modify-write itself.
    ///
    /// # Parameters
    ///
    /// * `reg` - Register to modify.
    /// * `mask` - Bits to modify.
    /// * `value` - New value of the bits selected by `mask`.
    pub fn modify_register_addr(
        &mut self,
        reg: Register,
        mask: u8,
        value: u8,
    ) -> Result<(), SPIE, CSE> {
        let mut data = [Instruction::Bitmod as u8, reg as u8, mask, value];
        self.transfer(&mut data)?;
        Ok(())
    }

    /// Transfers an array of bytes via SPI with the chip selected, returning
    /// the bytes the slave sent back.
    fn transfer<'b>(&mut self, bytes: &'b mut [u8]) -> Result<&'b [u8], SPIE, CSE> {
        self.cs.set_low().map_err(Error::Hal)?;
        let result = self.spi.transfer(bytes);
        self.cs.set_high().map_err(Error::Hal)?;
        result.map_err(Error::Spi)
    }
}

impl<SPI, CS, SPIE, CSE> embedded_hal::can::nb::Can for MCP2515<SPI, CS>
where
    SPI: Transfer<u8, Error = SPIE>,
    CS: OutputPin<Error = CSE>,
    SPIE: Debug,
    CSE: Debug,
{
    type Frame = CanFrame;
    type Error = Error<SPIE, CSE>;

    /// Queues `frame` in the first free Tx buffer. Never replaces a pending
    /// frame.
    fn transmit(&mut self, frame: &Self::Frame) -> nb::Result<Option<Self::Frame>, Self::Error> {
        Self::check_transmittable(frame)?;
        match self.find_free_tx_buf()? {
            Some(buf) => {
                self.write_frame_to(buf, frame)?;
                Ok(None)
            }
            None => Err(nb::Error::WouldBlock),
        }
    }

    fn receive(&mut self) -> nb::Result<Self::Frame, Self::Error> {
        match self.read_frame()? {
            Some(frame) => Ok(frame),
            None => Err(nb::Error::WouldBlock),
        }
    }
}
