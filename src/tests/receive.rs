use embedded_hal::can::{ExtendedId, Frame, Id, StandardId};

use crate::buffer::RxBuf;
use crate::error::{Error, ErrorCategory};
use crate::regs::Register;
use crate::stat::Interrupts;
use crate::tests::sim::configured;
use crate::Settings;

fn standard(id: u16) -> Id {
    StandardId::new(id).unwrap().into()
}

fn extended(id: u32) -> Id {
    ExtendedId::new(id).unwrap().into()
}

fn extended_header(id: u32, dlc: u8) -> [u8; 5] {
    [
        (id >> 21) as u8,
        (((id >> 18) & 0x07) << 5) as u8 | 0x08 | ((id >> 16) & 0x03) as u8,
        (id >> 8) as u8,
        id as u8,
        dlc,
    ]
}

#[test]
fn test_read_frame_none_available() {
    let (chip, mut mcp) = configured(Settings::default());

    assert!(!mcp.is_frame_available().unwrap());
    assert_eq!(None, mcp.read_frame().unwrap());
    assert_eq!(vec![vec![0xA0, 0x00], vec![0xA0, 0x00]], chip.exchanges());
}

#[test]
fn test_is_frame_available_does_not_clear() {
    let (chip, mut mcp) = configured(Settings::default());
    chip.receive(RxBuf::B1, [0x24, 0x60, 0x00, 0x00, 0x01], &[0x42]);

    assert!(mcp.is_frame_available().unwrap());
    assert!(mcp.is_frame_available().unwrap());
    assert_eq!(Interrupts::RX1.bits(), chip.reg(Register::CANINTF));
}

#[test]
fn test_read_standard_frame() {
    let (chip, mut mcp) = configured(Settings::default());
    chip.receive(RxBuf::B0, [0x24, 0x60, 0x00, 0x00, 0x03], &[0x01, 0x02, 0x03]);

    let frame = mcp.read_frame().unwrap().unwrap();
    assert_eq!(standard(0x123), frame.id());
    assert!(!frame.is_extended());
    assert!(!frame.is_remote_frame());
    assert_eq!(3, frame.dlc());
    assert_eq!([0x01, 0x02, 0x03], frame.data());

    assert_eq!(
        vec![
            vec![0xA0, 0x00],
            vec![0x03, 0x61, 0, 0, 0, 0, 0],
            vec![0x03, 0x60, 0],
            vec![0x03, 0x66, 0, 0, 0],
            vec![0x05, 0x2C, 0x01, 0x00],
        ],
        chip.exchanges()
    );
    assert_eq!(0, chip.reg(Register::CANINTF));
}

#[test]
fn test_read_frame_keeps_other_flags() {
    let (chip, mut mcp) = configured(Settings::default());
    chip.receive(RxBuf::B0, [0x00, 0x20, 0x00, 0x00, 0x00], &[]);
    let others = Interrupts::TX0 | Interrupts::ERR | Interrupts::MERR;
    chip.set_reg(Register::CANINTF, chip.reg(Register::CANINTF) | others.bits());

    mcp.read_frame().unwrap().unwrap();
    assert_eq!(others.bits(), chip.reg(Register::CANINTF));
}

#[test]
fn test_read_frame_buffer_priority() {
    let (chip, mut mcp) = configured(Settings::default());
    chip.receive(RxBuf::B1, [0x00, 0x40, 0x00, 0x00, 0x01], &[0xB1]);
    chip.receive(RxBuf::B0, [0x00, 0x20, 0x00, 0x00, 0x01], &[0xB0]);

    let first = mcp.read_frame().unwrap().unwrap();
    assert_eq!(standard(1), first.id());
    assert_eq!([0xB0], first.data());
    assert_eq!(Interrupts::RX1.bits(), chip.reg(Register::CANINTF));

    let second = mcp.read_frame().unwrap().unwrap();
    assert_eq!(standard(2), second.id());
    assert_eq!([0xB1], second.data());

    assert_eq!(None, mcp.read_frame().unwrap());
}

#[test]
fn test_read_extended_frame() {
    let (chip, mut mcp) = configured(Settings::default());

    for id in [0, 1, 0x3FFFF, 0x40000, 0x14C92A2B, 0x12345678, 0x1FFFFFFF] {
        chip.receive(RxBuf::B0, extended_header(id, 2), &[0xAB, 0xCD]);
        let frame = mcp.read_frame().unwrap().unwrap();
        assert!(frame.is_extended());
        assert_eq!(extended(id), frame.id());
        assert_eq!([0xAB, 0xCD], frame.data());
    }

    assert_eq!([0xA6, 0x49, 0x2A, 0x2B, 0x00], extended_header(0x14C92A2B, 0));
}

#[test]
fn test_read_frame_lengths() {
    let (chip, mut mcp) = configured(Settings::default());
    let payload = [0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17];

    for dlc in 0..=8u8 {
        chip.clear_log();
        chip.receive(RxBuf::B1, [0x00, 0x20, 0x00, 0x00, dlc], &payload);
        let frame = mcp.read_frame().unwrap().unwrap();
        assert_eq!(dlc as usize, frame.dlc());
        assert_eq!(&payload[..dlc as usize], frame.data());
        // The data registers are only read when there is data.
        let reads = if dlc == 0 { 3 } else { 4 };
        assert_eq!(reads + 1, chip.exchanges().len());
    }
}

#[test]
fn test_read_frame_masks_dlc() {
    let (chip, mut mcp) = configured(Settings::default());
    // Bit 6 of the DLC register is the RTR bit of extended frames.
    chip.receive(RxBuf::B0, [0x00, 0x20, 0x00, 0x00, 0x42], &[0x01, 0x02]);

    let frame = mcp.read_frame().unwrap().unwrap();
    assert_eq!(2, frame.dlc());
    assert_eq!([0x01, 0x02], frame.data());
}

#[test]
fn test_read_corrupt_frame() {
    let (chip, mut mcp) = configured(Settings::default());

    for dlc in 9..=15u8 {
        chip.receive(RxBuf::B0, [0x00, 0x20, 0x00, 0x00, dlc], &[]);
        let error = mcp.read_frame().unwrap_err();
        assert_eq!(Error::CorruptFrame(dlc), error);
        assert_eq!(ErrorCategory::InvalidData, error.category());
        // The frame stays in the buffer.
        assert_eq!(Interrupts::RX0.bits(), chip.reg(Register::CANINTF));
        assert!(mcp.is_frame_available().unwrap());

        mcp.discard_frame(RxBuf::B0).unwrap();
        assert_eq!(0, chip.reg(Register::CANINTF));
    }
}

#[test]
fn test_read_remote_frame() {
    let (chip, mut mcp) = configured(Settings::default());
    chip.receive(RxBuf::B1, [0x24, 0x60, 0x00, 0x00, 0x04], &[]);
    chip.set_reg(Register::RXB1CTRL, chip.reg(Register::RXB1CTRL) | 0x08);

    let frame = mcp.read_frame().unwrap().unwrap();
    assert!(frame.is_remote_frame());
    assert_eq!(standard(0x123), frame.id());
    assert_eq!(4, frame.dlc());
}

#[test]
fn test_read_frame_from_buffer() {
    let (chip, mut mcp) = configured(Settings::default());
    chip.receive(RxBuf::B0, [0x00, 0x20, 0x00, 0x00, 0x01], &[0x00]);
    chip.receive(RxBuf::B1, [0xFF, 0xE0, 0x00, 0x00, 0x01], &[0x01]);

    let frame = mcp.read_frame_from(RxBuf::B1).unwrap();
    assert_eq!(standard(0x7FF), frame.id());
    assert_eq!(Interrupts::RX0.bits(), chip.reg(Register::CANINTF));
}

#[test]
fn test_standard_id_round_trip() {
    let (chip, mut mcp) = configured(Settings::default());

    for raw in 0..=0x7FFu16 {
        let sent = crate::frame::CanFrame::new(StandardId::new(raw).unwrap(), &[raw as u8]).unwrap();
        mcp.write_frame(&sent, 0).unwrap();

        let header = chip.dump(Register::TXB0SIDH, 5);
        assert_eq!([(raw >> 3) as u8, (raw << 5) as u8, 0, 0, 1], header[..]);

        chip.set_reg(Register::TXB0CTRL, 0);
        chip.receive(RxBuf::B0, [header[0], header[1], header[2], header[3], header[4]], &[raw as u8]);
        assert_eq!(Some(sent), mcp.read_frame().unwrap());
    }
}

#[test]
fn test_read_frame_bus_failure() {
    let (chip, mut mcp) = configured(Settings::default());
    chip.receive(RxBuf::B0, [0x00, 0x20, 0x00, 0x00, 0x00], &[]);
    // Fail reading the header, after READ STATUS succeeded.
    chip.fail_after(1);

    let error = mcp.read_frame().unwrap_err();
    assert_eq!(ErrorCategory::Transport, error.category());
    assert!(matches!(error, Error::Spi(_)));
    assert_eq!(Interrupts::RX0.bits(), chip.reg(Register::CANINTF));
    assert_eq!(0, chip.state.borrow().unselected);
}
