//! Builder 模式实现
//!
//! 提供链式构造 `GarageDoorDriver` 实例的便捷方式。

use crate::clock::{Clock, MonotonicClock};
use crate::driver::GarageDoorDriver;
use crate::error::DriverError;
use crate::pipeline::PipelineConfig;
use garage_protocol::DEFAULT_BAUD_RATE;
use garage_serial::SerialAdapter;

/// GarageDoorDriver Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use garage_driver::{GarageDoorBuilder, PipelineConfig};
///
/// let driver = GarageDoorBuilder::new()
///     .port("/dev/ttyUSB0")
///     .baud_rate(1200)
///     .pipeline_config(PipelineConfig::default())
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct GarageDoorBuilder {
    /// 串口设备路径（未设置时自动选择第一个串口）
    port: Option<String>,
    /// 波特率（默认 1200）
    baud_rate: Option<u32>,
    /// Pipeline 配置
    pipeline_config: Option<PipelineConfig>,
}

impl GarageDoorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置串口设备（可选，默认自动检测）
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// 设置波特率（可选，默认 1200）
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = Some(baud_rate);
        self
    }

    pub fn pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline_config = Some(config);
        self
    }

    /// 打开串口并启动驱动
    ///
    /// # 错误
    /// - `DriverError::Serial`: 没有可用串口、串口打开失败
    /// - `DriverError::IoThread`: IO 线程创建失败
    #[cfg(feature = "serialport-backend")]
    pub fn build(self) -> Result<GarageDoorDriver, DriverError> {
        use garage_serial::{
            SerialDeviceError, SerialDeviceErrorKind, SerialError, SerialPortAdapter,
            SerialPortConfig,
        };

        let path = match self.port.clone() {
            Some(path) => path,
            None => {
                let ports = garage_serial::list_ports()?;
                let first = ports.into_iter().next().ok_or_else(|| {
                    SerialError::Device(SerialDeviceError::new(
                        SerialDeviceErrorKind::NotFound,
                        "no serial port found",
                    ))
                })?;
                tracing::info!("No port specified, using '{}'", first);
                first
            },
        };

        let mut config = SerialPortConfig::new(path.as_str());
        config.baud_rate = self.baud_rate.unwrap_or(DEFAULT_BAUD_RATE);
        let adapter = SerialPortAdapter::open(&config)?;

        Ok(self.build_with_adapter(adapter)?.with_port_name(path))
    }

    /// 使用已有的适配器启动驱动（单调时钟）
    pub fn build_with_adapter<A>(self, adapter: A) -> Result<GarageDoorDriver, DriverError>
    where
        A: SerialAdapter + Send + 'static,
    {
        self.build_with(adapter, MonotonicClock::new())
    }

    /// 使用已有的适配器和时钟启动驱动
    pub fn build_with<A, C>(self, adapter: A, clock: C) -> Result<GarageDoorDriver, DriverError>
    where
        A: SerialAdapter + Send + 'static,
        C: Clock + Send + 'static,
    {
        let port = self.port.unwrap_or_else(|| "unknown".to_string());
        GarageDoorDriver::new(adapter, clock, self.pipeline_config)
            .map(|driver| driver.with_port_name(port))
    }

    /// 配置的波特率（未设置时为默认值）
    pub fn effective_baud_rate(&self) -> u32 {
        self.baud_rate.unwrap_or(DEFAULT_BAUD_RATE)
    }

    /// 显式指定的串口设备
    pub fn port_name(&self) -> Option<&str> {
        self.port.as_deref()
    }
}
