//! Host-side driver for the LED/PWM/encoder motor board.
//!
//! Every operation is a single vendor control transfer on endpoint 0. Two
//! firmware builds share VID 0x6666 / PID 0x0003, so the caller picks the
//! client explicitly:
//!
//! ```rust,ignore
//! use motor_link::EncoderUsb;
//!
//! let mut board = EncoderUsb::open()?;
//! board.set_duty_f(1000)?;
//! assert_eq!(board.get_duty_f()?, 1000);
//! let angle = board.get_angle()?;
//! println!("{:?}", angle.as_bytes());
//! ```

pub mod modules;

pub use modules::blink::BlinkUsb;
pub use modules::constants::{USB_PID, USB_VID};
pub use modules::encoder::EncoderUsb;
pub use modules::error::DeviceError;
pub use modules::protocol::{
    decode_u16_le, BlinkRequest, CommandProtocol, ControlTransferDescriptor, Decoding, Direction,
    EncoderRequest, RequestCode,
};
pub use modules::register::Register;
pub use modules::types::{
    DeviceConfig, DeviceInfo, DutyValue, FirmwareVariant, IntoDuty, SensorReading,
};
pub use modules::usb::{
    find_device, is_device_present, open_device, scan_devices, ControlTransport, UsbDevice,
};
