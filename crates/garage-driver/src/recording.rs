//! 总线录制（Trace Recording）
//!
//! [`TraceRecordingHook`] 把收发的每个字节通过有界通道转交给录制线程，
//! 队列满时丢弃并计数，不阻塞 IO 线程。
//!
//! # 文本格式
//!
//! 每行一个字节：
//!
//! ```text
//! # garage-bus trace
//! 1000 rx 38
//! 1010 rx 52
//! 2000 tx 30
//! ```
//!
//! 空行和 `#` 开头的注释行被忽略。

use crate::hooks::BusCallback;
use crate::state::Channel;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// 录制队列容量
const TRACE_QUEUE_CAPACITY: usize = 100_000;

/// 字节方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 从总线读到
    Rx,
    /// 本端写出
    Tx,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Rx => "rx",
            Direction::Tx => "tx",
        }
    }
}

/// 带时间戳的总线字节
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry {
    /// 单调时钟时间（毫秒）
    pub timestamp_ms: u64,
    pub direction: Direction,
    pub byte: u8,
}

/// 录制文件解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceParseError {
    #[error("line {line}: expected '<timestamp_ms> <rx|tx> <hex byte>'")]
    MissingField { line: usize },

    #[error("line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp { line: usize, value: String },

    #[error("line {line}: invalid direction '{value}'")]
    InvalidDirection { line: usize, value: String },

    #[error("line {line}: invalid byte '{value}'")]
    InvalidByte { line: usize, value: String },
}

/// 格式化一个录制条目（不含换行）
pub fn format_trace_entry(entry: &TraceEntry) -> String {
    format!(
        "{} {} {:02x}",
        entry.timestamp_ms,
        entry.direction.as_str(),
        entry.byte
    )
}

/// 解析录制文本
pub fn parse_trace(text: &str) -> Result<Vec<TraceEntry>, TraceParseError> {
    let mut entries = Vec::new();
    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw_line.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        let mut fields = content.split_whitespace();
        let (Some(ts), Some(dir), Some(byte)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(TraceParseError::MissingField { line });
        };

        let timestamp_ms = ts
            .parse::<u64>()
            .map_err(|_| TraceParseError::InvalidTimestamp {
                line,
                value: ts.to_string(),
            })?;
        let direction = match dir {
            "rx" => Direction::Rx,
            "tx" => Direction::Tx,
            _ => {
                return Err(TraceParseError::InvalidDirection {
                    line,
                    value: dir.to_string(),
                });
            },
        };
        let hex = byte
            .strip_prefix("0x")
            .or_else(|| byte.strip_prefix("0X"))
            .unwrap_or(byte);
        let byte = u8::from_str_radix(hex, 16).map_err(|_| TraceParseError::InvalidByte {
            line,
            value: byte.to_string(),
        })?;

        entries.push(TraceEntry {
            timestamp_ms,
            direction,
            byte,
        });
    }
    Ok(entries)
}

/// 异步录制钩子（Bounded Queue）
///
/// 队列满（或接收端已关闭）时丢弃新条目并递增 `dropped_count`。
pub struct TraceRecordingHook {
    tx: Sender<TraceEntry>,
    /// 丢弃计数
    dropped: Arc<AtomicU64>,
    /// 成功入队计数
    recorded: Arc<AtomicU64>,
}

impl TraceRecordingHook {
    /// 创建录制钩子（容量 100,000 个字节）
    #[must_use]
    pub fn new() -> (Self, Receiver<TraceEntry>) {
        Self::with_capacity(TRACE_QUEUE_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, Receiver<TraceEntry>) {
        let (tx, rx) = bounded(capacity);
        let hook = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
            recorded: Arc::new(AtomicU64::new(0)),
        };
        (hook, rx)
    }

    /// 丢弃计数器（在注册回调前 clone 持有）
    #[must_use]
    pub fn dropped_counter(&self) -> &Arc<AtomicU64> {
        &self.dropped
    }

    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn recorded_count(&self) -> u64 {
        self.recorded.load(Ordering::Relaxed)
    }

    #[inline]
    fn record(&self, entry: TraceEntry) {
        if self.tx.try_send(entry).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        } else {
            self.recorded.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl BusCallback for TraceRecordingHook {
    fn on_state_changed(&self, _channel: Channel, _value: bool) {}

    #[inline]
    fn on_byte_received(&self, timestamp_ms: u64, byte: u8) {
        self.record(TraceEntry {
            timestamp_ms,
            direction: Direction::Rx,
            byte,
        });
    }

    #[inline]
    fn on_byte_sent(&self, timestamp_ms: u64, byte: u8) {
        self.record(TraceEntry {
            timestamp_ms,
            direction: Direction::Tx,
            byte,
        });
    }
}
