//! 列出串口命令

use anyhow::{Context, Result};
use clap::Args;

/// 列出串口命令参数
#[derive(Args, Debug)]
pub struct PortsCommand {}

impl PortsCommand {
    pub fn execute(&self) -> Result<()> {
        let ports = garage_serial::list_ports().context("枚举串口失败")?;

        if ports.is_empty() {
            println!("未发现串口设备");
            return Ok(());
        }

        println!("可用串口:");
        for port in ports {
            println!("  {}", port);
        }
        Ok(())
    }
}
