//! 开关写入命令
//!
//! 与 `toggle` 相同地发出一次切换，但以“目标值”的形式表达：
//! 总线不支持设置绝对值，请求的值只用于提示。

use super::toggle::{wait_sequence_sent, watch};
use crate::connection::ConnectionArgs;
use crate::display::ChangePrinter;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use garage_driver::Channel;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// 请求的开关值
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SwitchValue {
    On,
    Off,
}

impl SwitchValue {
    pub fn as_bool(self) -> bool {
        matches!(self, SwitchValue::On)
    }
}

/// 开关写入命令参数
#[derive(Args, Debug)]
pub struct SwitchCommand {
    /// 通道名称（door, light, lock）
    #[arg(value_parser = parse_switch_channel)]
    pub channel: Channel,

    /// 请求的值
    #[arg(value_enum)]
    pub value: SwitchValue,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// 序列发送完成后继续观察状态的时长（秒）
    #[arg(short, long, default_value_t = 3)]
    pub watch: u64,
}

fn parse_switch_channel(name: &str) -> Result<Channel, String> {
    match Channel::from_name(name) {
        Some(channel) if channel.toggle_kind().is_some() => Ok(channel),
        Some(channel) => Err(format!("{} 是只读通道", channel)),
        None => Err(format!("未知通道: {}", name)),
    }
}

impl SwitchCommand {
    pub fn execute(&self, config_path: &Path) -> Result<()> {
        let driver = self.connection.connect(config_path)?;
        driver.add_callback(Arc::new(ChangePrinter));

        let requested = self.value.as_bool();
        driver
            .write_switch(self.channel, requested)
            .with_context(|| format!("写开关 {} 失败", self.channel))?;
        println!("🔘 {} -> {:?}（新状态在下一次查询应答后更新）", self.channel, self.value);

        wait_sequence_sent(&driver)?;
        watch(&driver, Duration::from_secs(self.watch));
        Ok(())
    }
}
