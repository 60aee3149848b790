//! LED + 正反 PWM + AS5048A 编码器固件的客户端。

use crate::modules::error::DeviceError;
use crate::modules::protocol::{CommandProtocol, EncoderRequest};
use crate::modules::types::{DeviceConfig, IntoDuty, SensorReading};
use crate::modules::usb::{open_device, ControlTransport, UsbDevice};

/// 带编码器的电机驱动板。
///
/// 角度、角速度和电流读数以原始字节返回，由调用者解码
/// （参见 [`SensorReading`] 上的辅助方法）。
pub struct EncoderUsb<T: ControlTransport = UsbDevice> {
    protocol: CommandProtocol<T>,
}

impl EncoderUsb<UsbDevice> {
    /// 使用默认 VID/PID 打开设备。
    pub fn open() -> Result<Self, DeviceError> {
        Self::open_with(&DeviceConfig::default())
    }

    /// 使用指定配置打开设备。
    pub fn open_with(config: &DeviceConfig) -> Result<Self, DeviceError> {
        Ok(Self::from_transport(open_device(config)?))
    }
}

impl<T: ControlTransport> EncoderUsb<T> {
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
        self.protocol.send(EncoderRequest::ToggleLed1, 0)
    }

    /// 切换 LED2。
    pub fn toggle_led2(&mut self) -> Result<(), DeviceError> {
        self.protocol.send(EncoderRequest::ToggleLed2, 0)
    }

    /// 切换 LED3。
    pub fn toggle_led3(&mut self) -> Result<(), DeviceError> {
        self.protocol.send(EncoderRequest::ToggleLed3, 0)
    }

    /// 设置正转通道占空比。
    pub fn set_duty_f<D: IntoDuty>(&mut self, duty: D) -> Result<(), DeviceError> {
        let duty = duty.into_duty()?;
        self.protocol.send_duty(EncoderRequest::SetDutyF, duty)
    }

    /// 设置反转通道占空比。
    pub fn set_duty_r<D: IntoDuty>(&mut self, duty: D) -> Result<(), DeviceError> {
        let duty = duty.into_duty()?;
        self.protocol.send_duty(EncoderRequest::SetDutyR, duty)
    }

    /// 读取正转通道占空比。
    pub fn get_duty_f(&mut self) -> Result<u16, DeviceError> {
        self.protocol.fetch_u16(EncoderRequest::GetDutyF)
    }

    /// 读取反转通道占空比。
    pub fn get_duty_r(&mut self) -> Result<u16, DeviceError> {
        self.protocol.fetch_u16(EncoderRequest::GetDutyR)
    }

    /// 读取角度（2 字节原始数据）。
    pub fn get_angle(&mut self) -> Result<SensorReading, DeviceError> {
        self.read_sensor(EncoderRequest::GetAngle)
    }

    /// 读取角速度（4 字节原始数据）。
    pub fn get_angle_speed(&mut self) -> Result<SensorReading, DeviceError> {
        self.read_sensor(EncoderRequest::GetAngleSpeed)
    }

    /// 读取电流（2 字节原始数据）。
    pub fn get_current(&mut self) -> Result<SensorReading, DeviceError> {
        self.read_sensor(EncoderRequest::GetCurrent)
    }

    fn read_sensor(&mut self, request: EncoderRequest) -> Result<SensorReading, DeviceError> {
        self.protocol.fetch(request).map(SensorReading::new)
    }
}

impl<T: ControlTransport> Drop for EncoderUsb<T> {
    fn drop(&mut self) {
        self.close();
    }
}
