//! 电机驱动板库的公共类型定义。

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::modules::constants::{TIMEOUT_MS, USB_PID, USB_VID};
use crate::modules::error::DeviceError;
use crate::modules::register::{ANGLE_MASK, ANGLE_STEPS};

/// PWM 占空比（16 位无符号）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DutyValue(pub u16);

impl DutyValue {
    pub const MAX: DutyValue = DutyValue(u16::MAX);

    /// 获取原始值（即控制传输的 wValue）。
    pub fn get(self) -> u16 {
        self.0
    }

    fn from_i128(value: i128) -> Result<Self, DeviceError> {
        u16::try_from(value)
            .map(DutyValue)
            .map_err(|_| DeviceError::Conversion(format!("{} 超出范围 0..=65535", value)))
    }

    fn from_float(value: f64) -> Result<Self, DeviceError> {
        if !value.is_finite() {
            return Err(DeviceError::Conversion(format!("{} 不是有限数", value)));
        }
        // 向零截断
        Self::from_i128(value.trunc() as i128)
    }
}

impl From<u16> for DutyValue {
    fn from(value: u16) -> Self {
        DutyValue(value)
    }
}

impl From<DutyValue> for u16 {
    fn from(duty: DutyValue) -> u16 {
        duty.0
    }
}

impl fmt::Display for DutyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DutyValue {
    type Err = DeviceError;

    /// 只接受整数字面量（允许前后空白和正负号）。
    ///
    /// "12.5" 这类输入会失败。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i128 = s
            .trim()
            .parse()
            .map_err(|_| DeviceError::Conversion(format!("无法将 {:?} 转换为整数", s)))?;
        Self::from_i128(value)
    }
}

/// 可转换为占空比的输入。
pub trait IntoDuty {
    fn into_duty(self) -> Result<DutyValue, DeviceError>;
}

impl IntoDuty for DutyValue {
    fn into_duty(self) -> Result<DutyValue, DeviceError> {
        Ok(self)
    }
}

macro_rules! impl_into_duty_int {
    ($($t:ty),*) => {
        $(
            impl IntoDuty for $t {
                fn into_duty(self) -> Result<DutyValue, DeviceError> {
                    DutyValue::from_i128(self as i128)
                }
            }
        )*
    };
}

impl_into_duty_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl IntoDuty for f32 {
    fn into_duty(self) -> Result<DutyValue, DeviceError> {
        DutyValue::from_float(self as f64)
    }
}

impl IntoDuty for f64 {
    fn into_duty(self) -> Result<DutyValue, DeviceError> {
        DutyValue::from_float(self)
    }
}

impl IntoDuty for &str {
    fn into_duty(self) -> Result<DutyValue, DeviceError> {
        self.parse()
    }
}

impl IntoDuty for String {
    fn into_duty(self) -> Result<DutyValue, DeviceError> {
        self.as_str().parse()
    }
}

/// 传感器原始读数（角度、角速度或电流）。
///
/// 协议层不解释这些字节，原样返回给调用者。
/// 下面的辅助方法由调用者按需使用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorReading(Vec<u8>);

impl SensorReading {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// 获取原始字节。
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 按小端序解释 2 字节读数。
    pub fn as_u16_le(&self) -> Option<u16> {
        let bytes: [u8; 2] = self.0.as_slice().try_into().ok()?;
        Some(u16::from_le_bytes(bytes))
    }

    /// 按小端序解释 4 字节读数。
    pub fn as_u32_le(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.0.as_slice().try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    /// 编码器 14 位角度值。
    pub fn angle_raw(&self) -> Option<u16> {
        self.as_u16_le().map(|v| v & ANGLE_MASK)
    }

    /// 编码器角度（度）。
    pub fn angle_degrees(&self) -> Option<f32> {
        self.angle_raw()
            .map(|v| v as f32 * 360.0 / ANGLE_STEPS as f32)
    }
}

impl AsRef<[u8]> for SensorReading {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<SensorReading> for Vec<u8> {
    fn from(reading: SensorReading) -> Vec<u8> {
        reading.0
    }
}

/// 固件类型。两种固件共用同一个 VID/PID，必须在构造时显式选择。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareVariant {
    /// LED + 单路 PWM。
    Blink,
    /// 三个 LED + 正反两路 PWM + 编码器。
    Encoder,
}

impl fmt::Display for FirmwareVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirmwareVariant::Blink => write!(f, "blink"),
            FirmwareVariant::Encoder => write!(f, "encoder"),
        }
    }
}

impl FromStr for FirmwareVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "blink" => Ok(FirmwareVariant::Blink),
            "b" | "encoder" => Ok(FirmwareVariant::Encoder),
            other => Err(format!("未知固件类型: {}", other)),
        }
    }
}

/// 设备连接配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// 厂商 ID。
    pub vendor_id: u16,
    /// 产品 ID。
    pub product_id: u16,
    /// 每次控制传输的超时时间。
    pub timeout: Duration,
}

impl DeviceConfig {
    pub fn new() -> Self {
        Self {
            vendor_id: USB_VID,
            product_id: USB_PID,
            timeout: Duration::from_millis(TIMEOUT_MS),
        }
    }

    pub fn with_ids(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self.product_id = product_id;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 设备信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// 厂商 ID。
    pub vid: u16,
    /// 产品 ID。
    pub pid: u16,
    /// 总线号。
    pub bus: u8,
    /// 设备地址。
    pub address: u8,
}

impl DeviceInfo {
    pub fn matches(&self, vid: u16, pid: u16) -> bool {
        self.vid == vid && self.pid == pid
    }
}

impl AsRef<DeviceInfo> for DeviceInfo {
    fn as_ref(&self) -> &DeviceInfo {
        self
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} (bus {:03}, addr {:03})",
            self.vid, self.pid, self.bus, self.address
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_from_integers() {
        assert_eq!(1000u32.into_duty().unwrap(), DutyValue(1000));
        assert_eq!(0i64.into_duty().unwrap(), DutyValue(0));
        assert_eq!(65535usize.into_duty().unwrap(), DutyValue::MAX);
        assert!(matches!(65536u32.into_duty(), Err(DeviceError::Conversion(_))));
        assert!(matches!((-1i32).into_duty(), Err(DeviceError::Conversion(_))));
    }

    #[test]
    fn duty_from_floats_truncates() {
        assert_eq!(12.9f64.into_duty().unwrap(), DutyValue(12));
        assert_eq!((-0.5f32).into_duty().unwrap(), DutyValue(0));
        assert!(f64::NAN.into_duty().is_err());
        assert!(f64::INFINITY.into_duty().is_err());
        assert!(70000.0f64.into_duty().is_err());
    }

    #[test]
    fn duty_from_strings() {
        assert_eq!(" 32768 ".into_duty().unwrap(), DutyValue(32768));
        assert_eq!("+7".into_duty().unwrap(), DutyValue(7));
        assert!(matches!("12.5".into_duty(), Err(DeviceError::Conversion(_))));
        assert!(matches!("fast".into_duty(), Err(DeviceError::Conversion(_))));
        assert!(String::from("").into_duty().is_err());
    }

    #[test]
    fn sensor_reading_helpers() {
        let angle = SensorReading::new(vec![0x00, 0x20]);
        assert_eq!(angle.as_u16_le(), Some(0x2000));
        assert_eq!(angle.angle_raw(), Some(0x2000));
        assert_eq!(angle.angle_degrees(), Some(180.0));
        assert_eq!(angle.as_u32_le(), None);

        let flagged = SensorReading::new(vec![0xFF, 0xFF]);
        assert_eq!(flagged.angle_raw(), Some(0x3FFF));

        let speed = SensorReading::new(vec![1, 0, 0, 0]);
        assert_eq!(speed.as_u32_le(), Some(1));
        assert_eq!(speed.as_u16_le(), None);
        assert_eq!(speed.len(), 4);
    }

    #[test]
    fn variant_parsing() {
        assert_eq!("A".parse::<FirmwareVariant>(), Ok(FirmwareVariant::Blink));
        assert_eq!("encoder".parse::<FirmwareVariant>(), Ok(FirmwareVariant::Encoder));
        assert!("c".parse::<FirmwareVariant>().is_err());
        assert_eq!(FirmwareVariant::Blink.to_string(), "blink");
    }

    #[test]
    fn default_config_uses_board_ids() {
        let config = DeviceConfig::default();
        assert_eq!(config.vendor_id, 0x6666);
        assert_eq!(config.product_id, 0x0003);
        assert_eq!(config.timeout, Duration::from_millis(1000));

        let custom = config.with_ids(0x1234, 0x0001).with_timeout(Duration::from_millis(50));
        assert_eq!((custom.vendor_id, custom.product_id), (0x1234, 0x0001));
        assert_eq!(custom.timeout, Duration::from_millis(50));
    }
}
