//! AS5048A 磁编码器寄存器表。
//!
//! 当前的厂商请求不直接访问寄存器，这里保留地址以便以后扩展。

/// 14 位数据字段掩码。
pub const ANGLE_MASK: u16 = 0x3FFF;

/// 一圈的角度步数（14 位）。
pub const ANGLE_STEPS: u32 = 1 << 14;

const READ_FLAG: u16 = 0x4000;
const PARITY_BIT: u32 = 15;

/// AS5048A 寄存器地址。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Register {
    /// 空操作
    Nop = 0x0000,
    /// 清除错误标志
    ClearErrorFlag = 0x0001,
    /// 编程控制
    ProgrammingControl = 0x0003,
    /// OTP 零位高 8 位
    OtpZeroPosHi = 0x0016,
    /// OTP 零位低 6 位
    OtpZeroPosLo = 0x0017,
    /// 诊断与自动增益控制
    DiagAutoGainControl = 0x3FFD,
    /// CORDIC 幅值
    Magnitude = 0x3FFE,
    /// 零位校正后的角度
    Angle = 0x3FFF,
}

impl Register {
    pub const ALL: [Register; 8] = [
        Register::Nop,
        Register::ClearErrorFlag,
        Register::ProgrammingControl,
        Register::OtpZeroPosHi,
        Register::OtpZeroPosLo,
        Register::DiagAutoGainControl,
        Register::Magnitude,
        Register::Angle,
    ];

    pub fn address(self) -> u16 {
        self as u16
    }

    /// 读命令帧：bit14 置 1，bit15 为偶校验位。
    pub fn read_command(self) -> u16 {
        with_parity(READ_FLAG | self.address())
    }

    /// 写命令帧：bit14 为 0，bit15 为偶校验位。
    pub fn write_command(self) -> u16 {
        with_parity(self.address())
    }
}

impl From<Register> for u16 {
    fn from(reg: Register) -> u16 {
        reg as u16
    }
}

fn with_parity(frame: u16) -> u16 {
    let frame = frame & 0x7FFF;
    frame | (((frame.count_ones() & 1) as u16) << PARITY_BIT)
}
