//! 离线解码命令
//!
//! 把录制文件中接收到的字节按原始时间戳回放给解码器，打印每一次状态变化

use crate::display::{format_change, print_state};
use anyhow::{Context, Result};
use clap::Args;
use garage_driver::{
    Channel, Direction, DoorState, GarageDoor, ManualClock, ToggleMatch, TraceEntry, parse_trace,
};
use garage_protocol::ToggleKind;
use garage_serial::MockSerialAdapter;
use std::path::PathBuf;

/// 离线解码命令参数
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// 录制文件路径
    pub input: PathBuf,

    /// 同时打印确认到的切换序列
    #[arg(short, long)]
    pub toggles: bool,
}

/// 回放中观察到的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeEvent {
    Changed {
        timestamp_ms: u64,
        channel: Channel,
        value: bool,
    },
    Toggle {
        timestamp_ms: u64,
        kind: ToggleKind,
        matched: ToggleMatch,
    },
}

/// 回放结果
#[derive(Debug, Default)]
pub struct DecodeSummary {
    pub events: Vec<DecodeEvent>,
    pub rx_bytes: usize,
    pub skipped_tx: usize,
    pub final_state: DoorState,
}

/// 回放录制条目
///
/// 只有 `rx` 条目进入解码器：总线是共享线路，本端写出的字节已经以 `rx` 的形式被录下。
pub fn replay(entries: &[TraceEntry]) -> Result<DecodeSummary> {
    let (adapter, bus) = MockSerialAdapter::new();
    let clock = ManualClock::new(1);
    let mut garage = GarageDoor::new(adapter, clock.clone());
    let mut summary = DecodeSummary::default();

    for entry in entries {
        if entry.direction == Direction::Tx {
            summary.skipped_tx += 1;
            continue;
        }
        clock.set(entry.timestamp_ms);
        bus.inject(&[entry.byte]);
        let report = garage.loop_once().context("回放失败")?;
        summary.rx_bytes += report.received;

        if let Some((kind, matched)) = garage.last_report().and_then(|r| r.toggle) {
            summary.events.push(DecodeEvent::Toggle {
                timestamp_ms: entry.timestamp_ms,
                kind,
                matched,
            });
        }
        for (channel, value) in report.changes {
            summary.events.push(DecodeEvent::Changed {
                timestamp_ms: entry.timestamp_ms,
                channel,
                value,
            });
        }
    }

    summary.final_state = garage.state();
    Ok(summary)
}

impl DecodeCommand {
    pub fn execute(&self) -> Result<()> {
        let text = std::fs::read_to_string(&self.input)
            .with_context(|| format!("读取录制文件失败: {}", self.input.display()))?;
        let entries = parse_trace(&text)
            .with_context(|| format!("解析录制文件失败: {}", self.input.display()))?;

        println!("📁 文件: {} ({} 条)", self.input.display(), entries.len());
        let summary = replay(&entries)?;

        for event in &summary.events {
            match *event {
                DecodeEvent::Changed {
                    timestamp_ms,
                    channel,
                    value,
                } => println!("{:>10}ms  {}", timestamp_ms, format_change(channel, value)),
                DecodeEvent::Toggle {
                    timestamp_ms,
                    kind,
                    matched,
                } if self.toggles => {
                    println!("{:>10}ms  toggle {} ({:?})", timestamp_ms, kind, matched)
                },
                DecodeEvent::Toggle { .. } => {},
            }
        }

        println!(
            "\n解码 {} 个接收字节（跳过 {} 个发送记录）",
            summary.rx_bytes, summary.skipped_tx
        );
        print_state(&summary.final_state);
        Ok(())
    }
}
