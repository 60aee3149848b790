//! 厂商请求协议：请求码、控制传输描述符和单次传输的执行与解码。

use crate::modules::constants::{
    ANGLE_LEN, ANGLE_SPEED_LEN, CURRENT_LEN, DUTY_LEN, REQUEST_INDEX, REQUEST_TYPE_IN,
    REQUEST_TYPE_OUT,
};
use crate::modules::error::DeviceError;
use crate::modules::types::DutyValue;
use crate::modules::usb::ControlTransport;

/// 控制传输方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 主机到设备 (0x40)。
    Out,
    /// 设备到主机 (0xC0)。
    In,
}

impl Direction {
    /// bmRequestType 字段。
    pub fn request_type(self) -> u8 {
        match self {
            Direction::Out => REQUEST_TYPE_OUT,
            Direction::In => REQUEST_TYPE_IN,
        }
    }
}

/// 应答解码方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoding {
    /// 无应答数据。
    None,
    /// 2 字节小端无符号整数。
    U16Le,
    /// 原样返回。
    Raw,
}

/// 一个请求码对应的控制传输参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlTransferDescriptor {
    pub direction: Direction,
    pub request: u8,
    pub length: usize,
    pub decoding: Decoding,
}

impl ControlTransferDescriptor {
    const fn toggle(request: u8) -> Self {
        Self {
            direction: Direction::Out,
            request,
            length: 0,
            decoding: Decoding::None,
        }
    }

    const fn set_value(request: u8) -> Self {
        Self::toggle(request)
    }

    const fn get_u16(request: u8) -> Self {
        Self {
            direction: Direction::In,
            request,
            length: DUTY_LEN,
            decoding: Decoding::U16Le,
        }
    }

    const fn get_raw(request: u8, length: usize) -> Self {
        Self {
            direction: Direction::In,
            request,
            length,
            decoding: Decoding::Raw,
        }
    }
}

/// 厂商请求码（每种固件一个实现）。
pub trait RequestCode: Copy {
    /// 请求名称，用于日志和错误信息。
    fn name(self) -> &'static str;

    fn descriptor(self) -> ControlTransferDescriptor;
}

/// LED + 单路 PWM 固件的请求码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlinkRequest {
    ToggleLed1 = 0,
    SetDuty = 1,
    GetDuty = 2,
}

impl BlinkRequest {
    pub const ALL: [BlinkRequest; 3] = [
        BlinkRequest::ToggleLed1,
        BlinkRequest::SetDuty,
        BlinkRequest::GetDuty,
    ];
}

impl RequestCode for BlinkRequest {
    fn name(self) -> &'static str {
        match self {
            BlinkRequest::ToggleLed1 => "TOGGLE_LED1",
            BlinkRequest::SetDuty => "SET_DUTY",
            BlinkRequest::GetDuty => "GET_DUTY",
        }
    }

    fn descriptor(self) -> ControlTransferDescriptor {
        let request = self as u8;
        match self {
            BlinkRequest::ToggleLed1 => ControlTransferDescriptor::toggle(request),
            BlinkRequest::SetDuty => ControlTransferDescriptor::set_value(request),
            BlinkRequest::GetDuty => ControlTransferDescriptor::get_u16(request),
        }
    }
}

/// LED + 正反 PWM + 编码器固件的请求码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EncoderRequest {
    ToggleLed1 = 1,
    ToggleLed2 = 2,
    ToggleLed3 = 3,
    SetDutyF = 4,
    SetDutyR = 5,
    GetDutyF = 6,
    GetDutyR = 7,
    GetAngle = 8,
    GetAngleSpeed = 9,
    GetCurrent = 10,
}

impl EncoderRequest {
    pub const ALL: [EncoderRequest; 10] = [
        EncoderRequest::ToggleLed1,
        EncoderRequest::ToggleLed2,
        EncoderRequest::ToggleLed3,
        EncoderRequest::SetDutyF,
        EncoderRequest::SetDutyR,
        EncoderRequest::GetDutyF,
        EncoderRequest::GetDutyR,
        EncoderRequest::GetAngle,
        EncoderRequest::GetAngleSpeed,
        EncoderRequest::GetCurrent,
    ];
}

impl RequestCode for EncoderRequest {
    fn name(self) -> &'static str {
        match self {
            EncoderRequest::ToggleLed1 => "TOGGLE_LED1",
            EncoderRequest::ToggleLed2 => "TOGGLE_LED2",
            EncoderRequest::ToggleLed3 => "TOGGLE_LED3",
            EncoderRequest::SetDutyF => "SET_DUTY_F",
            EncoderRequest::SetDutyR => "SET_DUTY_R",
            EncoderRequest::GetDutyF => "GET_DUTY_F",
            EncoderRequest::GetDutyR => "GET_DUTY_R",
            EncoderRequest::GetAngle => "GET_ANGLE",
            EncoderRequest::GetAngleSpeed => "GET_ANGLE_SPEED",
            EncoderRequest::GetCurrent => "GET_CURRENT",
        }
    }

    fn descriptor(self) -> ControlTransferDescriptor {
        use EncoderRequest::*;

        let request = self as u8;
        match self {
            ToggleLed1 | ToggleLed2 | ToggleLed3 => ControlTransferDescriptor::toggle(request),
            SetDutyF | SetDutyR => ControlTransferDescriptor::set_value(request),
            GetDutyF | GetDutyR => ControlTransferDescriptor::get_u16(request),
            GetAngle => ControlTransferDescriptor::get_raw(request, ANGLE_LEN),
            GetAngleSpeed => ControlTransferDescriptor::get_raw(request, ANGLE_SPEED_LEN),
            GetCurrent => ControlTransferDescriptor::get_raw(request, CURRENT_LEN),
        }
    }
}

/// 将 2 字节小端数据解码为整数（低字节 + 高字节 * 256）。
///
/// 长度不是 2 时返回 None。
pub fn decode_u16_le(bytes: &[u8]) -> Option<u16> {
    match bytes {
        [lo, hi] => Some(*lo as u16 + *hi as u16 * 256),
        _ => None,
    }
}

/// 命令协议：每个操作恰好对应一次控制传输。
///
/// 句柄在 `close()` 之前处于打开状态，之后所有操作都返回 `ClosedHandle`。
pub struct CommandProtocol<T: ControlTransport> {
    transport: Option<T>,
}

impl<T: ControlTransport> CommandProtocol<T> {
    /// 使用已打开的传输创建协议层。
    pub fn new(transport: T) -> Self {
        Self {
            transport: Some(transport),
        }
    }

    /// 检查句柄是否仍然打开。
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// 释放句柄。关闭后不可再打开。
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            #[cfg(feature = "logging")]
            log::info!("Device handle closed");
        }
    }

    /// 获取底层传输的引用。
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// 获取底层传输的可变引用。
    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    /// 发送 OUT 请求，wValue 为 `value`，无数据阶段。
    pub fn send<R: RequestCode>(&mut self, request: R, value: u16) -> Result<(), DeviceError> {
        let desc = checked(request, Direction::Out, None)?;
        let transport = self.transport.as_mut().ok_or(DeviceError::ClosedHandle)?;

        #[cfg(feature = "logging")]
        log::debug!(
            "{}: request_type={:#04x}, request={}, value={}",
            request.name(),
            desc.direction.request_type(),
            desc.request,
            value
        );

        transport
            .write_control(
                desc.direction.request_type(),
                desc.request,
                value,
                REQUEST_INDEX,
                &[],
            )
            .map(|_| ())
            .map_err(|e| transfer_failed(request, e))
    }

    /// 发送 IN 请求并返回原始应答，长度必须与描述符一致。
    pub fn fetch<R: RequestCode>(&mut self, request: R) -> Result<Vec<u8>, DeviceError> {
        let desc = checked(request, Direction::In, None)?;
        let transport = self.transport.as_mut().ok_or(DeviceError::ClosedHandle)?;

        let mut buf = vec![0u8; desc.length];
        let read = transport
            .read_control(
                desc.direction.request_type(),
                desc.request,
                0,
                REQUEST_INDEX,
                &mut buf,
            )
            .map_err(|e| transfer_failed(request, e))?;

        #[cfg(feature = "logging")]
        log::debug!("{}: {} of {} bytes received", request.name(), read, desc.length);

        if read != desc.length {
            #[cfg(feature = "logging")]
            log::warn!(
                "{} returned {} bytes, expected {}",
                request.name(),
                read,
                desc.length
            );
            return Err(DeviceError::LengthMismatch {
                operation: request.name(),
                expected: desc.length,
                actual: read,
            });
        }
        Ok(buf)
    }

    /// 发送 IN 请求并按 2 字节小端整数解码。
    pub fn fetch_u16<R: RequestCode>(&mut self, request: R) -> Result<u16, DeviceError> {
        checked(request, Direction::In, Some(Decoding::U16Le))?;
        let bytes = self.fetch(request)?;
        decode_u16_le(&bytes).ok_or(DeviceError::LengthMismatch {
            operation: request.name(),
            expected: DUTY_LEN,
            actual: bytes.len(),
        })
    }

    /// 设置占空比。
    pub fn send_duty<R: RequestCode>(
        &mut self,
        request: R,
        duty: DutyValue,
    ) -> Result<(), DeviceError> {
        self.send(request, duty.get())
    }
}

/// 在访问设备前检查请求的方向和解码方式。
fn checked<R: RequestCode>(
    request: R,
    direction: Direction,
    decoding: Option<Decoding>,
) -> Result<ControlTransferDescriptor, DeviceError> {
    let desc = request.descriptor();
    let decoding_ok = decoding.map_or(true, |d| d == desc.decoding);
    if desc.direction != direction || !decoding_ok {
        #[cfg(feature = "logging")]
        log::error!("{} cannot be issued as {:?} {:?}", request.name(), direction, decoding);
        return Err(DeviceError::WrongRequest {
            operation: request.name(),
        });
    }
    Ok(desc)
}

fn transfer_failed<R: RequestCode>(request: R, source: rusb::Error) -> DeviceError {
    #[cfg(feature = "logging")]
    log::warn!("Could not send {} vendor request: {}", request.name(), source);
    DeviceError::TransferFailed {
        operation: request.name(),
        source,
    }
}
