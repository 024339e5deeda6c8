//! Bit-timing configuration (`CNF1`, `CNF2`, `CNF3`).
//!
//! All parameters are given in time quanta (or, for `brp`, as the divisor)
//! and are 1-based: a parameter of 1 is packed as 0.

use crate::{
    regs::{Cnf1, Cnf2, Cnf3},
    CanSpeed, McpSpeed,
};

/// How often the bus is sampled at the sample point.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub enum SampleMode {
    /// Sample once (`SAM = 0`).
    Once = 0x00,
    /// Sample three times (`SAM = 1`).
    Thrice = 0x40,
}

/// Names a [`BitTiming`] parameter that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub enum BitTimingParam {
    SyncJumpWidth,
    BaudRatePrescaler,
    PropagationSegment,
    PhaseSegment1,
    PhaseSegment2,
}

/// Bit-timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub struct BitTiming {
    /// Synchronization jump width, 1..=4.
    pub sjw: u8,
    /// Baud rate prescaler, 1..=64.
    pub brp: u8,
    /// Propagation segment, 1..=8.
    pub prop_seg: u8,
    /// Phase segment 1, 1..=8.
    pub phase_seg1: u8,
    /// Phase segment 2, 1..=8.
    pub phase_seg2: u8,
    /// Bus sampling mode.
    pub sampling: SampleMode,
    /// Take phase segment 2 from `phase_seg2` (`BTLMODE`) rather than
    /// deriving it from phase segment 1.
    pub phase_seg2_programmable: bool,
    /// Output a start-of-frame signal on `CLKOUT`.
    pub sof: bool,
    /// Enable the wake-up low-pass filter.
    pub wake_filter: bool,
}

impl Default for BitTiming {
    fn default() -> Self {
        Self {
            sjw: 1,
            brp: 1,
            prop_seg: 2,
            phase_seg1: 4,
            phase_seg2: 3,
            sampling: SampleMode::Thrice,
            phase_seg2_programmable: true,
            sof: false,
            wake_filter: false,
        }
    }
}

impl BitTiming {
    /// Validates the parameters and packs them into the three configuration
    /// registers.
    pub fn registers(&self) -> Result<(Cnf1, Cnf2, Cnf3), BitTimingParam> {
        let sjw = packed(self.sjw, 4, BitTimingParam::SyncJumpWidth)?;
        let brp = packed(self.brp, 64, BitTimingParam::BaudRatePrescaler)?;
        let prop_seg = packed(self.prop_seg, 8, BitTimingParam::PropagationSegment)?;
        let phase_seg1 = packed(self.phase_seg1, 8, BitTimingParam::PhaseSegment1)?;
        let phase_seg2 = packed(self.phase_seg2, 8, BitTimingParam::PhaseSegment2)?;

        let cnf1 = Cnf1::new().with_sjw(sjw).with_brp(brp);
        let cnf2 = Cnf2::new()
            .with_btlmode(self.phase_seg2_programmable)
            .with_sam(self.sampling == SampleMode::Thrice)
            .with_phseg1(phase_seg1)
            .with_prseg(prop_seg);
        let cnf3 = Cnf3::new()
            .with_sof(self.sof)
            .with_wakfil(self.wake_filter)
            .with_phseg2(phase_seg2);
        Ok((cnf1, cnf2, cnf3))
    }

    /// Decodes packed configuration registers back into parameters.
    pub fn from_registers(cnf1: Cnf1, cnf2: Cnf2, cnf3: Cnf3) -> Self {
        Self {
            sjw: cnf1.sjw() + 1,
            brp: cnf1.brp() + 1,
            prop_seg: cnf2.prseg() + 1,
            phase_seg1: cnf2.phseg1() + 1,
            phase_seg2: cnf3.phseg2() + 1,
            sampling: if cnf2.sam() {
                SampleMode::Thrice
            } else {
                SampleMode::Once
            },
            phase_seg2_programmable: cnf2.btlmode(),
            sof: cnf3.sof(),
            wake_filter: cnf3.wakfil(),
        }
    }

    /// Looks up the timing for a bus speed given the oscillator attached to
    /// the MCP2515.
    pub fn preset(can_speed: CanSpeed, mcp_speed: McpSpeed) -> Option<Self> {
        // Sourced from https://github.com/coryjfowler/MCP_CAN_lib/blob/master/mcp_can_dfs.h#L251-L363
        let (cfg1, cfg2, cfg3): (u8, u8, u8) = match (mcp_speed, can_speed) {
            (McpSpeed::MHz8, CanSpeed::Kbps5) => (0xA7, 0xF6, 0x84),
            (McpSpeed::MHz8, CanSpeed::Kbps10) => (0x93, 0xF6, 0x84),
            (McpSpeed::MHz8, CanSpeed::Kbps20) => (0x89, 0xF6, 0x84),
            (McpSpeed::MHz8, CanSpeed::Kbps31_25) => (0x87, 0xE5, 0x83),
            (McpSpeed::MHz8, CanSpeed::Kbps33_3) => (0x85, 0xF6, 0x84),
            (McpSpeed::MHz8, CanSpeed::Kbps40) => (0x84, 0xF6, 0x84),
            (McpSpeed::MHz8, CanSpeed::Kbps50) => (0x84, 0xE5, 0x83),
            (McpSpeed::MHz8, CanSpeed::Kbps80) => (0x84, 0xD3, 0x81),
            (McpSpeed::MHz8, CanSpeed::Kbps100) => (0x81, 0xF6, 0x84),
            (McpSpeed::MHz8, CanSpeed::Kbps125) => (0x81, 0xE5, 0x83),
            (McpSpeed::MHz8, CanSpeed::Kbps200) => (0x80, 0xF6, 0x84),
            (McpSpeed::MHz8, CanSpeed::Kbps250) => (0x80, 0xE5, 0x83),
            (McpSpeed::MHz8, CanSpeed::Kbps500) => (0x00, 0xD1, 0x81),
            (McpSpeed::MHz8, CanSpeed::Kbps1000) => (0x00, 0xC0, 0x80),
            (McpSpeed::MHz16, CanSpeed::Kbps5) => (0x3F, 0xFF, 0x87),
            (McpSpeed::MHz16, CanSpeed::Kbps10) => (0x67, 0xF6, 0x84),
            (McpSpeed::MHz16, CanSpeed::Kbps20) => (0x53, 0xF6, 0x74),
            (McpSpeed::MHz16, CanSpeed::Kbps33_3) => (0x4E, 0xE5, 0x83),
            (McpSpeed::MHz16, CanSpeed::Kbps40) => (0x49, 0xF6, 0x84),
            (McpSpeed::MHz16, CanSpeed::Kbps50) => (0x47, 0xF6, 0x84),
            (McpSpeed::MHz16, CanSpeed::Kbps80) => (0x44, 0xF6, 0x84),
            (McpSpeed::MHz16, CanSpeed::Kbps100) => (0x44, 0xE5, 0x83),
            (McpSpeed::MHz16, CanSpeed::Kbps125) => (0x43, 0xE5, 0x83),
            (McpSpeed::MHz16, CanSpeed::Kbps200) => (0x41, 0xF6, 0x84),
            (McpSpeed::MHz16, CanSpeed::Kbps250) => (0x41, 0xE5, 0x83),
            (McpSpeed::MHz16, CanSpeed::Kbps500) => (0x40, 0xE5, 0x83),
            (McpSpeed::MHz16, CanSpeed::Kbps1000) => (0x00, 0xCA, 0x81),
            _ => return None,
        };
        Some(Self::from_registers(
            Cnf1::from_bytes([cfg1]),
            Cnf2::from_bytes([cfg2]),
            Cnf3::from_bytes([cfg3]),
        ))
    }
}

/// Checks `value` is within `1..=max` and returns it minus one.
fn packed(value: u8, max: u8, param: BitTimingParam) -> Result<u8, BitTimingParam> {
    if value == 0 || value > max {
        Err(param)
    } else {
        Ok(value - 1)
    }
}
