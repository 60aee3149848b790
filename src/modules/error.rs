//! 电机驱动板库的错误类型定义。

use thiserror::Error;

/// 与驱动板通信时可能发生的错误。
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("未找到设备 (VID={0:04x}, PID={1:04x})")]
    DeviceNotFound(u16, u16),

    #[error("USB 错误: {0}")]
    UsbError(String),

    #[error("无法发送 {operation} 厂商请求: {source}")]
    TransferFailed {
        operation: &'static str,
        #[source]
        source: rusb::Error,
    },

    #[error("占空比转换失败: {0}")]
    Conversion(String),

    #[error("{operation} 的方向或解码方式与调用不符")]
    WrongRequest { operation: &'static str },

    #[error("设备句柄已关闭")]
    ClosedHandle,

    #[error("{operation} 应答长度错误: 期望 {expected} 字节, 实际 {actual} 字节")]
    LengthMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl DeviceError {
    /// 失败的请求名称（仅传输类错误有）。
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            DeviceError::TransferFailed { operation, .. }
            | DeviceError::LengthMismatch { operation, .. }
            | DeviceError::WrongRequest { operation } => Some(*operation),
            _ => None,
        }
    }
}
