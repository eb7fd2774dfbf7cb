//! serialport 串口适配器实现
//!
//! 使用 `serialport` crate 打开 UART 设备（如 `/dev/ttyUSB0`、`COM3`）。
//!
//! ## 限制
//!
//! - 总线电平需要外部电路转换，本模块只负责字节收发
//! - **权限要求**：Linux 下通常需要 `dialout` 组权限

use crate::{SerialAdapter, SerialDeviceError, SerialDeviceErrorKind, SerialError};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// 串口参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortConfig {
    /// 设备路径
    pub path: String,
    /// 波特率（默认 1200）
    pub baud_rate: u32,
    /// 写超时（毫秒）
    pub write_timeout_ms: u64,
}

impl SerialPortConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: 1200,
            write_timeout_ms: 20,
        }
    }
}

/// serialport 适配器（8N1，无流控）
pub struct SerialPortAdapter {
    port: Box<dyn SerialPort>,
    path: String,
}

impl std::fmt::Debug for SerialPortAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortAdapter")
            .field("path", &self.path)
            .finish()
    }
}

impl SerialPortAdapter {
    /// 打开串口
    ///
    /// # 错误
    /// - `SerialError::Device`: 设备不存在、参数不支持或权限不足
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use garage_serial::{SerialPortAdapter, SerialPortConfig};
    ///
    /// let adapter = SerialPortAdapter::open(&SerialPortConfig::new("/dev/ttyUSB0")).unwrap();
    /// ```
    pub fn open(config: &SerialPortConfig) -> Result<Self, SerialError> {
        let port = serialport::new(config.path.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(config.write_timeout_ms))
            .open()
            .map_err(|e| map_port_error(&config.path, e))?;

        debug!(
            "Opened serial port '{}' at {} baud",
            config.path, config.baud_rate
        );

        Ok(Self {
            port,
            path: config.path.clone(),
        })
    }

    /// 设备路径
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl SerialAdapter for SerialPortAdapter {
    fn read_byte(&mut self) -> Result<Option<u8>, SerialError> {
        let pending = self
            .port
            .bytes_to_read()
            .map_err(|e| map_port_error(&self.path, e))?;
        if pending == 0 {
            return Ok(None);
        }

        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => {
                trace!("RX 0x{:02x}", buf[0]);
                Ok(Some(buf[0]))
            },
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Ok(None)
            },
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Err(SerialError::Disconnected),
            Err(e) => Err(SerialError::Io(e)),
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        self.port.write_all(&[byte])?;
        self.port.flush()?;
        trace!("TX 0x{:02x}", byte);
        Ok(())
    }
}

/// 列出系统上的串口设备路径
pub fn list_ports() -> Result<Vec<String>, SerialError> {
    let ports = serialport::available_ports().map_err(|e| map_port_error("<enumerate>", e))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// 将 serialport 错误映射为结构化设备错误
fn map_port_error(path: &str, e: serialport::Error) -> SerialError {
    let kind = match e.kind() {
        serialport::ErrorKind::NoDevice => SerialDeviceErrorKind::NoDevice,
        serialport::ErrorKind::InvalidInput => SerialDeviceErrorKind::UnsupportedConfig,
        serialport::ErrorKind::Io(ErrorKind::NotFound) => SerialDeviceErrorKind::NotFound,
        serialport::ErrorKind::Io(ErrorKind::PermissionDenied) => {
            SerialDeviceErrorKind::AccessDenied
        },
        serialport::ErrorKind::Io(_) => SerialDeviceErrorKind::Backend,
        _ => SerialDeviceErrorKind::Unknown,
    };
    SerialError::Device(SerialDeviceError::new(
        kind,
        format!("serial port '{}': {}", path, e.description),
    ))
}
