use embedded_hal::can::{nb::Can, ExtendedId, Frame, Id, StandardId};

use crate::buffer::TxBuf;
use crate::error::{Error, ErrorCategory, Unsupported};
use crate::frame::CanFrame;
use crate::regs::Register;
use crate::tests::sim::configured;
use crate::Settings;

fn standard(id: u16) -> Id {
    StandardId::new(id).unwrap().into()
}

#[test]
fn test_write_frame() {
    let (chip, mut mcp) = configured(Settings::default());
    let frame = CanFrame::new(standard(0x123), &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();

    mcp.write_frame(&frame, 1).unwrap();
    assert_eq!(
        vec![
            vec![0x02, 0x41, 0x24, 0x60, 0x00, 0x00, 0x04],
            vec![0x02, 0x46, 0xDE, 0xAD, 0xBE, 0xEF],
            vec![0x05, 0x40, 0x08, 0x08],
        ],
        chip.exchanges()
    );
    assert_eq!(0x08, chip.reg(Register::TXB1CTRL));
    assert_eq!(0x00, chip.reg(Register::TXB0CTRL));
    assert_eq!(0x00, chip.reg(Register::TXB2CTRL));
}

#[test]
fn test_write_empty_frame() {
    let (chip, mut mcp) = configured(Settings::default());
    let frame = CanFrame::new(standard(0x7FF), &[]).unwrap();

    mcp.write_frame(&frame, 2).unwrap();
    assert_eq!(
        vec![
            vec![0x02, 0x51, 0xFF, 0xE0, 0x00, 0x00, 0x00],
            vec![0x05, 0x50, 0x08, 0x08],
        ],
        chip.exchanges()
    );
}

#[test]
fn test_write_frame_keeps_priority() {
    let (chip, mut mcp) = configured(Settings::default());
    chip.set_reg(Register::TXB0CTRL, 0x03);

    let frame = CanFrame::new(standard(0x001), &[0x01]).unwrap();
    mcp.write_frame_to(TxBuf::B0, &frame).unwrap();
    assert_eq!(0x0B, chip.reg(Register::TXB0CTRL));
}

#[test]
fn test_write_frame_rejected() {
    let (chip, mut mcp) = configured(Settings::default());
    let frame = CanFrame::new(standard(0x100), &[0x01]).unwrap();

    let error = mcp.write_frame(&frame, 3).unwrap_err();
    assert_eq!(Error::InvalidTxBuffer(3), error);
    assert_eq!(ErrorCategory::InvalidArgument, error.category());

    let oversized = CanFrame {
        id: standard(0x100),
        rtr: false,
        dlc: 9,
        data: [0; 8],
    };
    let error = mcp.write_frame(&oversized, 0).unwrap_err();
    assert_eq!(Error::PayloadTooLong(9), error);
    assert_eq!(ErrorCategory::InvalidArgument, error.category());

    let extended = CanFrame::new(ExtendedId::new(0x100).unwrap(), &[0x01]).unwrap();
    let error = mcp.write_frame(&extended, 0).unwrap_err();
    assert_eq!(Error::Unsupported(Unsupported::ExtendedTransmit), error);
    assert_eq!(ErrorCategory::Unsupported, error.category());

    let remote = CanFrame::new_remote(standard(0x100), 2).unwrap();
    let error = mcp.write_frame(&remote, 0).unwrap_err();
    assert_eq!(Error::Unsupported(Unsupported::RemoteTransmit), error);

    assert!(chip.exchanges().is_empty());
}

#[test]
fn test_find_free_tx_buf() {
    let (chip, mut mcp) = configured(Settings::default());
    assert_eq!(Some(TxBuf::B0), mcp.find_free_tx_buf().unwrap());

    chip.set_reg(Register::TXB0CTRL, 0x08);
    assert_eq!(Some(TxBuf::B1), mcp.find_free_tx_buf().unwrap());

    chip.set_reg(Register::TXB1CTRL, 0x08);
    chip.set_reg(Register::TXB2CTRL, 0x0B);
    assert_eq!(None, mcp.find_free_tx_buf().unwrap());
    assert!(mcp.tx_status(TxBuf::B2).unwrap().txreq());
}

#[test]
fn test_transmit() {
    let (chip, mut mcp) = configured(Settings::default());
    chip.set_reg(Register::TXB0CTRL, 0x08);

    let frame = CanFrame::new(standard(0x123), &[0x01, 0x02]).unwrap();
    assert!(matches!(mcp.transmit(&frame), Ok(None)));
    assert_eq!(vec![0x24, 0x60, 0x00, 0x00, 0x02, 0x01, 0x02], chip.dump(Register::TXB1SIDH, 7));
    assert_eq!(0x08, chip.reg(Register::TXB1CTRL));

    chip.set_reg(Register::TXB2CTRL, 0x08);
    chip.clear_log();
    assert!(matches!(mcp.transmit(&frame), Err(nb::Error::WouldBlock)));
    // Only the three control registers were read.
    assert_eq!(3, chip.exchanges().len());
}

#[test]
fn test_transmit_rejected_before_bus_access() {
    let (chip, mut mcp) = configured(Settings::default());
    let frame = CanFrame::new(ExtendedId::new(0x1FFFFFFF).unwrap(), &[]).unwrap();

    assert!(matches!(
        mcp.transmit(&frame),
        Err(nb::Error::Other(Error::Unsupported(Unsupported::ExtendedTransmit)))
    ));
    assert!(chip.exchanges().is_empty());
}

#[test]
fn test_receive() {
    let (chip, mut mcp) = configured(Settings::default());
    assert!(matches!(mcp.receive(), Err(nb::Error::WouldBlock)));

    // Loop a frame back by hand.
    let frame = CanFrame::new(standard(0x321), &[0x0A]).unwrap();
    mcp.write_frame(&frame, 0).unwrap();
    let header = chip.dump(Register::TXB0SIDH, 5);
    chip.receive(
        crate::buffer::RxBuf::B1,
        [header[0], header[1], header[2], header[3], header[4]],
        &[0x0A],
    );

    assert_eq!(frame, mcp.receive().unwrap());
}
