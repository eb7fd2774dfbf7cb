//! # Garage Serial Adapter Layer
//!
//! 串口硬件抽象层，提供统一的单字节收发接口。
//!
//! 总线是半双工共享线路：本端写出的字节同样会出现在接收端，
//! 上层解码器会把它们当作普通总线流量处理。

use thiserror::Error;

#[cfg(feature = "serialport-backend")]
pub mod port;

#[cfg(feature = "serialport-backend")]
pub use port::{SerialPortAdapter, SerialPortConfig, list_ports};

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockBusHandle, MockSerialAdapter};

/// 串口适配层统一错误类型
#[derive(Error, Debug)]
pub enum SerialError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] SerialDeviceError),
    #[error("Serial port disconnected")]
    Disconnected,
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialDeviceErrorKind {
    Unknown,
    NotFound,
    NoDevice,
    AccessDenied,
    UnsupportedConfig,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct SerialDeviceError {
    pub kind: SerialDeviceErrorKind,
    pub message: String,
}

impl SerialDeviceError {
    pub fn new(kind: SerialDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// 是否为不可恢复的设备错误（设备拔出、权限不足等）
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            SerialDeviceErrorKind::NoDevice
                | SerialDeviceErrorKind::AccessDenied
                | SerialDeviceErrorKind::NotFound
        )
    }
}

impl From<String> for SerialDeviceError {
    fn from(message: String) -> Self {
        Self::new(SerialDeviceErrorKind::Unknown, message)
    }
}

impl From<&str> for SerialDeviceError {
    fn from(message: &str) -> Self {
        Self::new(SerialDeviceErrorKind::Unknown, message)
    }
}

impl SerialError {
    /// 是否应当终止 IO 循环
    pub fn is_fatal(&self) -> bool {
        match self {
            SerialError::Disconnected => true,
            SerialError::Device(e) => e.is_fatal(),
            SerialError::Io(_) => false,
        }
    }
}

/// 单字节串口收发接口
///
/// 两个方法都必须是非阻塞的：IO 循环在同一个线程里轮询读取并按时写出。
pub trait SerialAdapter {
    /// 读取一个已到达的字节，没有数据时返回 `Ok(None)`
    fn read_byte(&mut self) -> Result<Option<u8>, SerialError>;

    /// 写出一个字节
    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError>;
}

impl<A: SerialAdapter + ?Sized> SerialAdapter for Box<A> {
    fn read_byte(&mut self) -> Result<Option<u8>, SerialError> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        (**self).write_byte(byte)
    }
}
