//! 切换序列发送器
//!
//! 模拟一次按键：在总线上按固定间隔写出 3 个字节。发送器本身不睡眠，
//! 只记录每个字节的到期时间，由 IO 循环反复调用 [`ToggleSequencer::poll`] 按时写出。
//!
//! # 冲突回避
//!
//! 开始发送前检查最近一个总线字节：如果它在 200ms 内到达，
//! 整个序列推迟 100ms 开始。
//!
//! # 排队
//!
//! 同一时刻最多一个序列在发送、一个序列在排队。再有请求直接拒绝
//! （[`DriverError::ToggleBusy`]）。排队的序列在前一个完成后立即开始，
//! 并重新做冲突检查。

use crate::error::DriverError;
use crate::history::InputHistory;
use crate::scan_rate::AtomicScanRate;
use garage_protocol::{
    COLLISION_LOOKBACK_MS, COLLISION_START_DELAY_MS, ToggleKind, ToggleSequence,
};
use garage_serial::SerialAdapter;
use tracing::{debug, error, info, warn};

/// 切换请求的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// 立即开始（`start_offset_ms` 为冲突回避延迟）
    Started { start_offset_ms: u64 },
    /// 已有序列在发送，本次请求进入排队槽位
    Queued,
}

/// 正在发送的序列
#[derive(Debug, Clone, Copy)]
struct InFlight {
    kind: ToggleKind,
    /// 按值保存，发送期间不依赖外部数据
    sequence: ToggleSequence,
    /// byte1 的到期时间
    base_ms: u64,
    /// 下一个要写出的字节（0..3）
    step: usize,
}

impl InFlight {
    fn due_ms(&self) -> Option<u64> {
        self.sequence
            .offset_ms(self.step)
            .map(|offset| self.base_ms + offset)
    }
}

/// 切换序列发送器
#[derive(Debug)]
pub struct ToggleSequencer {
    in_flight: Option<InFlight>,
    queued: Option<ToggleKind>,
    scan_rate: AtomicScanRate,
    /// 本端最近一次写出字节的时间
    last_write_ms: u64,
}

impl ToggleSequencer {
    pub fn new(scan_rate: AtomicScanRate) -> Self {
        Self {
            in_flight: None,
            queued: None,
            scan_rate,
            last_write_ms: 0,
        }
    }

    /// 请求一次切换
    ///
    /// # 错误
    /// - `DriverError::ToggleBusy`: 已有序列在发送且排队槽位已被占用
    pub fn request(
        &mut self,
        kind: ToggleKind,
        now_ms: u64,
        history: &InputHistory,
    ) -> Result<ToggleOutcome, DriverError> {
        if self.in_flight.is_some() {
            if self.queued.is_some() {
                warn!("Rejecting {} toggle: sequencer busy", kind);
                return Err(DriverError::ToggleBusy);
            }
            debug!("Queueing {} toggle", kind);
            self.queued = Some(kind);
            return Ok(ToggleOutcome::Queued);
        }

        let start_offset_ms = self.start(kind, now_ms, history);
        Ok(ToggleOutcome::Started { start_offset_ms })
    }

    /// 写出所有已到期的字节中的第一个
    ///
    /// 返回本次写出的字节；没有到期字节时返回 `Ok(None)`。
    /// IO 循环应反复调用直到返回 `None`。
    ///
    /// # 错误
    /// 写失败时放弃当前序列和排队序列，撤销高频扫描请求。
    pub fn poll<A: SerialAdapter + ?Sized>(
        &mut self,
        now_ms: u64,
        adapter: &mut A,
        history: &InputHistory,
    ) -> Result<Option<u8>, DriverError> {
        let Some(mut flight) = self.in_flight else {
            return Ok(None);
        };
        let (Some(due), Some(byte)) = (flight.due_ms(), flight.sequence.byte(flight.step)) else {
            return Ok(None);
        };
        if now_ms < due {
            return Ok(None);
        }

        if let Err(e) = adapter.write_byte(byte) {
            error!("Aborting {} toggle at byte {}: {}", flight.kind, flight.step + 1, e);
            self.abort();
            return Err(e.into());
        }
        self.last_write_ms = now_ms;
        debug!(
            "Toggle {} byte{} 0x{:02x} at {}ms (due {}ms)",
            flight.kind,
            flight.step + 1,
            byte,
            now_ms,
            due
        );

        flight.step += 1;
        if flight.due_ms().is_some() {
            self.in_flight = Some(flight);
            return Ok(Some(byte));
        }

        info!("Toggle {} sequence sent", flight.kind);
        self.in_flight = None;
        match self.queued.take() {
            Some(next) => {
                self.start(next, now_ms, history);
            },
            None => self.scan_rate.release(),
        }
        Ok(Some(byte))
    }

    /// 放弃当前序列和排队序列
    pub fn abort(&mut self) {
        if let Some(queued) = self.queued.take() {
            warn!("Dropping queued {} toggle", queued);
        }
        self.in_flight = None;
        self.scan_rate.release();
    }

    /// 没有序列在发送或排队
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.queued.is_none()
    }

    /// 正在发送的序列
    pub fn in_flight(&self) -> Option<ToggleKind> {
        self.in_flight.map(|f| f.kind)
    }

    /// 排队中的序列
    pub fn queued(&self) -> Option<ToggleKind> {
        self.queued
    }

    /// 下一个字节的到期时间
    pub fn next_due_ms(&self) -> Option<u64> {
        self.in_flight.and_then(|f| f.due_ms())
    }

    pub fn scan_rate(&self) -> &AtomicScanRate {
        &self.scan_rate
    }

    fn start(&mut self, kind: ToggleKind, now_ms: u64, history: &InputHistory) -> u64 {
        self.scan_rate.request_high();

        let recent_ms = history
            .newest()
            .map(|entry| entry.timestamp_ms)
            .unwrap_or(0)
            .max(self.last_write_ms);
        let start_offset_ms = collision_offset(recent_ms, now_ms);
        if start_offset_ms > 0 {
            debug!(
                "Bus active {}ms ago, delaying {} toggle by {}ms",
                now_ms.saturating_sub(recent_ms),
                kind,
                start_offset_ms
            );
        }

        self.in_flight = Some(InFlight {
            kind,
            sequence: kind.sequence(),
            base_ms: now_ms + start_offset_ms,
            step: 0,
        });
        start_offset_ms
    }
}

/// 冲突回避起始偏移
///
/// 最近一个字节（时间戳非 0）在 200ms 内到达时返回 100ms，否则返回 0。
pub fn collision_offset(recent_ms: u64, now_ms: u64) -> u64 {
    if recent_ms != 0 && recent_ms + COLLISION_LOOKBACK_MS > now_ms {
        COLLISION_START_DELAY_MS
    } else {
        0
    }
}
