//! 切换命令
//!
//! 发送一次切换序列（模拟按下墙面按钮），然后观察状态变化

use crate::connection::ConnectionArgs;
use crate::display::{ChangePrinter, print_state};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use garage_driver::{GarageDoorDriver, ToggleOutcome};
use garage_protocol::ToggleKind;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 切换对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToggleTarget {
    Door,
    Light,
    Lock,
}

impl From<ToggleTarget> for ToggleKind {
    fn from(target: ToggleTarget) -> Self {
        match target {
            ToggleTarget::Door => ToggleKind::Door,
            ToggleTarget::Light => ToggleKind::Light,
            ToggleTarget::Lock => ToggleKind::Lock,
        }
    }
}

/// 切换命令参数
#[derive(Args, Debug)]
pub struct ToggleCommand {
    /// 切换对象
    #[arg(value_enum)]
    pub target: ToggleTarget,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// 序列发送完成后继续观察状态的时长（秒）
    #[arg(short, long, default_value_t = 3)]
    pub watch: u64,
}

impl ToggleCommand {
    pub fn execute(&self, config_path: &Path) -> Result<()> {
        let driver = self.connection.connect(config_path)?;
        driver.add_callback(Arc::new(ChangePrinter));

        let kind = ToggleKind::from(self.target);
        let outcome = driver
            .toggle_blocking(kind, Duration::from_secs(1))
            .with_context(|| format!("切换 {} 失败", kind))?;
        report_outcome(kind, outcome);

        wait_sequence_sent(&driver)?;
        watch(&driver, Duration::from_secs(self.watch));
        Ok(())
    }
}

pub(crate) fn report_outcome(kind: ToggleKind, outcome: ToggleOutcome) {
    match outcome {
        ToggleOutcome::Started { start_offset_ms: 0 } => {
            println!("🔘 {} 切换序列已开始", kind);
        },
        ToggleOutcome::Started { start_offset_ms } => {
            println!("🔘 {} 切换序列延迟 {}ms 开始（总线繁忙）", kind, start_offset_ms);
        },
        ToggleOutcome::Queued => println!("🔘 {} 切换序列已排队", kind),
    }
}

/// 等待切换序列写完（发送期间处于快速扫描）
pub(crate) fn wait_sequence_sent(driver: &GarageDoorDriver) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(2);
    while driver.is_fast_scanning() {
        anyhow::ensure!(driver.is_running(), "IO 线程已退出，切换序列未发送完成");
        anyhow::ensure!(Instant::now() < deadline, "切换序列发送超时");
        std::thread::sleep(Duration::from_millis(10));
    }
    println!("✅ 切换序列已发送");
    Ok(())
}

/// 观察状态变化，结束时打印完整状态
pub(crate) fn watch(driver: &GarageDoorDriver, duration: Duration) {
    if !duration.is_zero() {
        println!("👀 观察 {} 秒...", duration.as_secs());
        std::thread::sleep(duration);
    }
    print_state(&driver.state());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_maps_to_kind() {
        assert_eq!(ToggleKind::from(ToggleTarget::Door), ToggleKind::Door);
        assert_eq!(ToggleKind::from(ToggleTarget::Light), ToggleKind::Light);
        assert_eq!(ToggleKind::from(ToggleTarget::Lock), ToggleKind::Lock);
    }

    #[test]
    fn test_wait_sequence_sent_with_mock_bus() {
        let (adapter, bus) = garage_serial::MockSerialAdapter::new();
        let driver = garage_driver::GarageDoorBuilder::new()
            .build_with_adapter(adapter)
            .unwrap();

        let outcome = driver
            .toggle_blocking(ToggleKind::Lock, Duration::from_secs(1))
            .unwrap();
        assert!(matches!(outcome, ToggleOutcome::Started { .. }));
        wait_sequence_sent(&driver).unwrap();
        assert_eq!(bus.written(), vec![0x34, 0x35, 0x35]);
    }
}
