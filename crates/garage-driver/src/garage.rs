//! 解码器核心
//!
//! [`GarageDoor`] 把输入历史、帧解释器、切换序列发送器和状态去重器串在一起，
//! 由调用方（通常是 [`io_loop`](crate::pipeline::io_loop)）周期性调用
//! [`GarageDoor::loop_once`] 驱动。单线程、无阻塞。
//!
//! 总线是共享线路，本端写出的字节也会被读回来，解码器把它们当作普通流量处理。

use crate::clock::Clock;
use crate::error::DriverError;
use crate::history::InputHistory;
use crate::hooks::{BusCallback, HookManager};
use crate::interpreter::{ScanReport, interpret};
use crate::reconciler::StateReconciler;
use crate::scan_rate::AtomicScanRate;
use crate::sequencer::{ToggleOutcome, ToggleSequencer};
use crate::state::{Channel, DoorState};
use garage_protocol::ToggleKind;
use garage_serial::SerialAdapter;
use std::sync::{Arc, RwLock};
use tracing::{error, info, trace, warn};

/// 一次 `loop_once` 的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopReport {
    /// 读到的字节数
    pub received: usize,
    /// 写出的字节数
    pub sent: usize,
    /// 本次发布的状态变化
    pub changes: Vec<(Channel, bool)>,
}

/// 车库门总线解码器
pub struct GarageDoor<A: SerialAdapter, C: Clock> {
    adapter: A,
    clock: C,
    history: InputHistory,
    sequencer: ToggleSequencer,
    reconciler: StateReconciler,
    hooks: Arc<RwLock<HookManager>>,
    state: DoorState,
    last_report: Option<ScanReport>,
}

impl<A: SerialAdapter, C: Clock> GarageDoor<A, C> {
    pub fn new(adapter: A, clock: C) -> Self {
        Self::with_scan_rate(adapter, clock, AtomicScanRate::new())
    }

    /// 使用外部共享的扫描频率标志（IO 循环据此选择睡眠间隔）
    pub fn with_scan_rate(adapter: A, clock: C, scan_rate: AtomicScanRate) -> Self {
        Self {
            adapter,
            clock,
            history: InputHistory::new(),
            sequencer: ToggleSequencer::new(scan_rate),
            reconciler: StateReconciler::new(),
            hooks: Arc::new(RwLock::new(HookManager::new())),
            state: DoorState::default(),
            last_report: None,
        }
    }

    /// 使用外部共享的钩子管理器
    pub fn with_hooks(mut self, hooks: Arc<RwLock<HookManager>>) -> Self {
        self.hooks = hooks;
        self
    }

    /// 执行一轮：写出到期字节 → 读取所有可用字节 → 有新字节时重新扫描一次
    ///
    /// # 错误
    /// - 写失败：当前切换序列被放弃，返回 `DriverError::Serial`
    /// - 致命读错误（设备断开等）：返回 `DriverError::Serial`
    ///
    /// 非致命读错误只记录日志，本轮停止读取。
    pub fn loop_once(&mut self) -> Result<LoopReport, DriverError> {
        let mut report = LoopReport::default();

        // 1. 到期的切换字节
        let now = self.clock.now_ms();
        while let Some(byte) = self
            .sequencer
            .poll(now, &mut self.adapter, &self.history)?
        {
            report.sent += 1;
            if let Ok(hooks) = self.hooks.read() {
                hooks.trigger_sent(now, byte);
            }
        }

        // 2. 读取所有已到达的字节
        loop {
            match self.adapter.read_byte() {
                Ok(Some(byte)) => {
                    let timestamp_ms = self.clock.now_ms();
                    trace!("RX 0x{:02x} @ {}ms", byte, timestamp_ms);
                    self.history.push(byte, timestamp_ms);
                    report.received += 1;
                    if let Ok(hooks) = self.hooks.read() {
                        hooks.trigger_received(timestamp_ms, byte);
                    }
                },
                Ok(None) => break,
                Err(e) if e.is_fatal() => {
                    error!("Serial read failed: {}", e);
                    return Err(e.into());
                },
                Err(e) => {
                    error!("Serial read error: {}", e);
                    break;
                },
            }
        }

        // 3. 有新字节才重新扫描
        if report.received > 0 {
            report.changes = self.rescan();
        }
        Ok(report)
    }

    /// 重新扫描当前窗口并发布变化
    fn rescan(&mut self) -> Vec<(Channel, bool)> {
        let scan = interpret(&self.history.latest_window());
        let changes = self.reconciler.reconcile(&scan.snapshot);
        self.last_report = Some(scan);

        if changes.is_empty() {
            return changes;
        }
        let now = self.clock.now_ms();
        for &(channel, value) in &changes {
            info!("Publishing {}: {}", channel, value);
            self.state.set(channel, value);
            self.state.updated_ms = now;
        }
        if let Ok(hooks) = self.hooks.read() {
            for &(channel, value) in &changes {
                hooks.trigger_state(channel, value);
            }
        }
        changes
    }

    /// 请求一次切换（模拟按键）
    ///
    /// # 错误
    /// - `DriverError::ToggleBusy`: 已有序列在发送且另一个在排队
    pub fn toggle(&mut self, kind: ToggleKind) -> Result<ToggleOutcome, DriverError> {
        let now = self.clock.now_ms();
        let outcome = self.sequencer.request(kind, now, &self.history)?;
        info!("Toggle {} requested: {:?}", kind, outcome);
        Ok(outcome)
    }

    /// 写开关：不论请求的值是什么都发出一次切换
    ///
    /// 不会乐观地发布新状态，新状态在下一次查询应答后到达。
    /// 只读通道（红外对射）返回 `Ok(None)`。
    pub fn write_switch(
        &mut self,
        channel: Channel,
        requested: bool,
    ) -> Result<Option<ToggleOutcome>, DriverError> {
        let Some(kind) = channel.toggle_kind() else {
            warn!("Channel {} is read-only, ignoring write", channel);
            return Ok(None);
        };
        if self.state.get(channel) == Some(requested) {
            info!("{} already {}, toggling anyway", channel, requested);
        }
        self.toggle(kind).map(Some)
    }

    pub fn add_callback(&self, callback: Arc<dyn BusCallback>) {
        if let Ok(mut hooks) = self.hooks.write() {
            hooks.add_callback(callback);
        }
    }

    /// 钩子管理器（可在运行期间添加回调）
    pub fn hooks(&self) -> Arc<RwLock<HookManager>> {
        self.hooks.clone()
    }

    /// 已发布的状态
    pub fn state(&self) -> DoorState {
        self.state
    }

    /// 最近一次扫描的报告
    pub fn last_report(&self) -> Option<&ScanReport> {
        self.last_report.as_ref()
    }

    pub fn history(&self) -> &InputHistory {
        &self.history
    }

    pub fn sequencer(&self) -> &ToggleSequencer {
        &self.sequencer
    }

    pub fn scan_rate(&self) -> &AtomicScanRate {
        self.sequencer.scan_rate()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }
}
