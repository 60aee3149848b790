//! 电机驱动板库的常量定义。

/// 驱动板的 USB 厂商 ID（两种固件相同）。
pub const USB_VID: u16 = 0x6666;

/// 驱动板的 USB 产品 ID（两种固件相同）。
pub const USB_PID: u16 = 0x0003;

/// 控制传输超时时间（毫秒）。
pub const TIMEOUT_MS: u64 = 1000;

/// 厂商请求，主机到设备。
pub const REQUEST_TYPE_OUT: u8 = 0x40;

/// 厂商请求，设备到主机。
pub const REQUEST_TYPE_IN: u8 = 0xC0;

/// 控制传输的 wIndex 字段。
pub const REQUEST_INDEX: u16 = 0;

/// 占空比读数长度（字节）。
pub const DUTY_LEN: usize = 2;
/// 角度读数长度（字节）。
pub const ANGLE_LEN: usize = 2;
/// 角速度读数长度（字节）。
pub const ANGLE_SPEED_LEN: usize = 4;
/// 电流读数长度（字节）。
pub const CURRENT_LEN: usize = 2;
