//! 电机驱动板库的 USB 底层操作。

use std::time::Duration;

use rusb::{Context, Device, DeviceHandle, UsbContext};

use crate::modules::error::DeviceError;
use crate::modules::types::{DeviceConfig, DeviceInfo};

/// 控制传输原语。
///
/// `UsbDevice` 通过 rusb 实现；测试中可以用记录调用的替身实现。
pub trait ControlTransport {
    /// 主机到设备的控制传输，返回写入的字节数。
    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> rusb::Result<usize>;

    /// 设备到主机的控制传输，返回读到的字节数。
    fn read_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> rusb::Result<usize>;
}

/// 已打开并完成配置的 USB 设备句柄。
pub struct UsbDevice {
    /// 设备句柄。
    handle: DeviceHandle<Context>,
    /// 控制传输超时。
    timeout: Duration,
    /// 打开时的设备信息。
    info: DeviceInfo,
}

impl UsbDevice {
    /// 创建新的 USB 设备。
    pub fn new(handle: DeviceHandle<Context>, timeout: Duration, info: DeviceInfo) -> Self {
        Self {
            handle,
            timeout,
            info,
        }
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

impl ControlTransport for UsbDevice {
    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> rusb::Result<usize> {
        self.handle
            .write_control(request_type, request, value, index, data, self.timeout)
    }

    fn read_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> rusb::Result<usize> {
        self.handle
            .read_control(request_type, request, value, index, buf, self.timeout)
    }
}

fn device_info<T: UsbContext>(device: &Device<T>) -> Option<DeviceInfo> {
    let desc = device.device_descriptor().ok()?;
    Some(DeviceInfo {
        vid: desc.vendor_id(),
        pid: desc.product_id(),
        bus: device.bus_number(),
        address: device.address(),
    })
}

/// 扫描所有 USB 设备。
pub fn scan_devices() -> Vec<DeviceInfo> {
    #[cfg(feature = "logging")]
    log::info!("Scanning USB devices...");
    let context = match Context::new() {
        Ok(c) => c,
        Err(_e) => {
            #[cfg(feature = "logging")]
            log::error!("Failed to create USB context: {}", _e);
            return Vec::new();
        }
    };

    let devices: Vec<DeviceInfo> = match context.devices() {
        Ok(dev_list) => dev_list.iter().filter_map(|d| device_info(&d)).collect(),
        Err(_e) => {
            #[cfg(feature = "logging")]
            log::error!("Failed to get device list: {}", _e);
            Vec::new()
        }
    };

    #[cfg(feature = "logging")]
    log::info!("Found {} USB devices", devices.len());
    devices
}

/// 在设备列表中查找第一个匹配的设备。
///
/// `open_device` 和 `is_device_present` 都通过这里选择设备。
pub fn find_device<D: AsRef<DeviceInfo>>(
    devices: &[D],
    vid: u16,
    pid: u16,
) -> Result<&D, DeviceError> {
    devices
        .iter()
        .find(|d| d.as_ref().matches(vid, pid))
        .ok_or(DeviceError::DeviceNotFound(vid, pid))
}

/// 枚举得到的设备及其描述信息。
struct Candidate {
    device: Device<Context>,
    info: DeviceInfo,
}

impl AsRef<DeviceInfo> for Candidate {
    fn as_ref(&self) -> &DeviceInfo {
        &self.info
    }
}

/// 检查驱动板是否存在。
pub fn is_device_present(vid: u16, pid: u16) -> bool {
    let present = find_device(&scan_devices(), vid, pid).is_ok();

    #[cfg(feature = "logging")]
    {
        if present {
            log::info!("Device {:04x}:{:04x} found", vid, pid);
        } else {
            log::info!("Device {:04x}:{:04x} not found", vid, pid);
        }
    }
    present
}

/// 打开驱动板并激活其配置。只查找一次，不重试。
pub fn open_device(config: &DeviceConfig) -> Result<UsbDevice, DeviceError> {
    let (vid, pid) = (config.vendor_id, config.product_id);

    #[cfg(feature = "logging")]
    log::info!("Opening device (VID={:04x}, PID={:04x})...", vid, pid);

    let context = Context::new().map_err(|e| {
        #[cfg(feature = "logging")]
        log::error!("Failed to create USB context: {}", e);
        DeviceError::UsbError(format!("创建上下文失败: {}", e))
    })?;

    let dev_list = context.devices().map_err(|e| {
        #[cfg(feature = "logging")]
        log::error!("Failed to get devices: {}", e);
        DeviceError::UsbError(format!("获取设备失败: {}", e))
    })?;

    let candidates: Vec<Candidate> = dev_list
        .iter()
        .filter_map(|device| device_info(&device).map(|info| Candidate { device, info }))
        .collect();

    let Candidate { device, info } = find_device(&candidates, vid, pid).map_err(|e| {
        #[cfg(feature = "logging")]
        log::error!("Device {:04x}:{:04x} not found", vid, pid);
        e
    })?;
    let info = info.clone();

    #[cfg(feature = "logging")]
    log::info!("Found matching device {}, attempting to open...", info);

    let handle = device.open().map_err(|e| {
        #[cfg(feature = "logging")]
        log::error!("Failed to open device: {}", e);
        DeviceError::UsbError(format!("打开设备失败: {}", e))
    })?;

    // 如果有内核驱动附着，先分离
    if let Ok(true) = handle.kernel_driver_active(0) {
        #[cfg(feature = "logging")]
        log::info!("Detaching kernel driver...");
        if let Err(_e) = handle.detach_kernel_driver(0) {
            #[cfg(feature = "logging")]
            log::warn!("Failed to detach kernel driver: {}", _e);
        }
    }

    // 激活第一个（唯一的）配置
    let config_number = device
        .config_descriptor(0)
        .map(|c| c.number())
        .map_err(|e| {
            #[cfg(feature = "logging")]
            log::error!("Failed to read configuration descriptor: {}", e);
            DeviceError::UsbError(format!("读取配置描述符失败: {}", e))
        })?;

    handle.set_active_configuration(config_number).map_err(|e| {
        #[cfg(feature = "logging")]
        log::error!("Failed to set configuration {}: {}", config_number, e);
        DeviceError::UsbError(format!("设置配置失败: {}", e))
    })?;

    #[cfg(feature = "logging")]
    log::info!("Configuration {} active on {}", config_number, info);

    Ok(UsbDevice::new(handle, config.timeout, info))
}
