//! LED + 单路 PWM 固件的客户端。

use crate::modules::error::DeviceError;
use crate::modules::protocol::{BlinkRequest, CommandProtocol};
use crate::modules::types::{DeviceConfig, IntoDuty};
use crate::modules::usb::{open_device, ControlTransport, UsbDevice};

/// LED + 单路 PWM 驱动板。
pub struct BlinkUsb<T: ControlTransport = UsbDevice> {
    protocol: CommandProtocol<T>,
}

impl BlinkUsb<UsbDevice> {
    /// 使用默认 VID/PID 打开设备。
    pub fn open() -> Result<Self, DeviceError> {
        Self::open_with(&DeviceConfig::default())
    }

    /// 使用指定配置打开设备。
    pub fn open_with(config: &DeviceConfig) -> Result<Self, DeviceError> {
        Ok(Self::from_transport(open_device(config)?))
    }
}

impl<T: ControlTransport> BlinkUsb<T> {
    /// 使用已打开的传输创建客户端。
    pub fn from_transport(transport: T) -> Self {
        Self {
            protocol: CommandProtocol::new(transport),
        }
    }

    /// 检查句柄是否仍然打开。
    pub fn is_open(&self) -> bool {
        self.protocol.is_open()
    }

    /// 关闭设备句柄。
    pub fn close(&mut self) {
        self.protocol.close();
    }

    /// 获取底层传输的引用。
    pub fn transport(&self) -> Option<&T> {
        self.protocol.transport()
    }

    /// 获取底层传输的可变引用。
    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.protocol.transport_mut()
    }

    /// 切换 LED1。
    pub fn toggle_led1(&mut self) -> Result<(), DeviceError> {
        self.protocol.send(BlinkRequest::ToggleLed1, 0)
    }

    /// 设置占空比。
    pub fn set_duty<D: IntoDuty>(&mut self, duty: D) -> Result<(), DeviceError> {
        let duty = duty.into_duty()?;
        self.protocol.send_duty(BlinkRequest::SetDuty, duty)
    }

    /// 读取占空比。
    pub fn get_duty(&mut self) -> Result<u16, DeviceError> {
        self.protocol.fetch_u16(BlinkRequest::GetDuty)
    }
}

impl<T: ControlTransport> Drop for BlinkUsb<T> {
    fn drop(&mut self) {
        self.close();
    }
}
