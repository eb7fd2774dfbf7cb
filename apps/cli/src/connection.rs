//! 串口连接参数
//!
//! 命令行参数优先，其次是配置文件，最后由驱动自动选择串口。

use crate::commands::config::CliConfig;
use anyhow::{Context, Result};
use clap::Args;
use garage_driver::{GarageDoorBuilder, GarageDoorDriver};
use std::path::Path;

/// 串口连接参数（各命令共用）
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// 串口设备（覆盖配置）
    #[arg(short, long)]
    pub port: Option<String>,

    /// 波特率（覆盖配置）
    #[arg(short, long)]
    pub baud_rate: Option<u32>,
}

impl ConnectionArgs {
    /// 合并配置文件，返回最终使用的 Builder
    pub fn builder(&self, config: &CliConfig) -> GarageDoorBuilder {
        let mut builder = GarageDoorBuilder::new();
        if let Some(port) = self.port.as_ref().or(config.port.as_ref()) {
            builder = builder.port(port.as_str());
        }
        if let Some(baud) = self.baud_rate.or(config.baud_rate) {
            builder = builder.baud_rate(baud);
        }
        builder
    }

    /// 打开串口并启动驱动
    pub fn connect(&self, config_path: &Path) -> Result<GarageDoorDriver> {
        let config = CliConfig::load(config_path)?;
        let builder = self.builder(&config);

        println!("⏳ 打开串口...");
        let driver = builder.build().context("打开串口失败")?;
        println!("✅ 已连接: {}", driver.port());
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let config = CliConfig {
            port: Some("/dev/ttyUSB0".to_string()),
            baud_rate: Some(2400),
        };
        let args = ConnectionArgs {
            port: Some("/dev/ttyUSB1".to_string()),
            baud_rate: None,
        };
        let builder = args.builder(&config);
        assert_eq!(builder.effective_baud_rate(), 2400);
        assert_eq!(builder.port_name(), Some("/dev/ttyUSB1"));
    }

    #[test]
    fn test_defaults() {
        let builder = ConnectionArgs::default().builder(&CliConfig::default());
        assert_eq!(builder.effective_baud_rate(), 1200);
        assert_eq!(builder.port_name(), None);
    }
}
