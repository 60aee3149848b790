//! 电机驱动板库的模块声明。

// 常量
pub mod constants;

// 错误类型
pub mod error;

// 公共类型
pub mod types;

// AS5048A 寄存器表
pub mod register;

// USB 底层操作
pub mod usb;

// 厂商请求协议
pub mod protocol;

// LED + PWM 固件
pub mod blink;

// LED + PWM + 编码器固件
pub mod encoder;
