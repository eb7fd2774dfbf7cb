//! Pipeline IO 循环模块
//!
//! 后台 IO 线程独占 [`GarageDoor`]：处理切换请求、驱动解码器、
//! 把变化后的状态发布到 `ArcSwap`。

use crate::clock::Clock;
use crate::error::DriverError;
use crate::garage::GarageDoor;
use crate::sequencer::ToggleOutcome;
use crate::state::DoorState;
use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use garage_protocol::ToggleKind;
use garage_serial::SerialAdapter;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Pipeline 配置
///
/// # Example
///
/// ```
/// use garage_driver::PipelineConfig;
///
/// // 默认：正常 16ms 轮询，发送切换序列期间 1ms 轮询
/// let config = PipelineConfig::default();
///
/// let config = PipelineConfig {
///     loop_interval_ms: 10,
///     ..PipelineConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 正常轮询间隔（毫秒）
    pub loop_interval_ms: u64,
    /// 高频扫描时的轮询间隔（毫秒）
    pub fast_loop_interval_ms: u64,
    /// 关闭时等待 IO 线程退出的超时（毫秒）
    pub join_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: 16,
            fast_loop_interval_ms: 1,
            join_timeout_ms: 500,
        }
    }
}

/// 切换请求（驱动句柄 → IO 线程）
#[derive(Debug)]
pub struct ToggleRequest {
    pub kind: ToggleKind,
    /// 需要结果时附带应答通道
    pub reply: Option<Sender<Result<ToggleOutcome, DriverError>>>,
}

/// IO 线程与驱动句柄共享的上下文
#[derive(Debug)]
pub struct DriverContext {
    /// 最新发布的状态
    pub state: ArcSwap<DoorState>,
    /// 运行标志
    pub is_running: AtomicBool,
    /// 累计收到的字节数
    pub rx_bytes: AtomicU64,
    /// 累计写出的字节数
    pub tx_bytes: AtomicU64,
}

impl DriverContext {
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(DoorState::default()),
            is_running: AtomicBool::new(true),
            rx_bytes: AtomicU64::new(0),
            tx_bytes: AtomicU64::new(0),
        }
    }
}

impl Default for DriverContext {
    fn default() -> Self {
        Self::new()
    }
}

/// IO 线程循环
///
/// 退出条件：运行标志被清除、请求通道断开、或串口出现致命错误。
/// 退出时清除运行标志。
///
/// # 参数
/// - `garage`: 解码器（移动到 IO 线程）
/// - `toggle_rx`: 切换请求通道
/// - `ctx`: 共享上下文
/// - `config`: Pipeline 配置
pub fn io_loop<A: SerialAdapter, C: Clock>(
    mut garage: GarageDoor<A, C>,
    toggle_rx: Receiver<ToggleRequest>,
    ctx: Arc<DriverContext>,
    config: PipelineConfig,
) {
    let interval = Duration::from_millis(config.loop_interval_ms);
    let fast_interval = Duration::from_millis(config.fast_loop_interval_ms);
    info!("IO loop started");

    'outer: while ctx.is_running.load(Ordering::Acquire) {
        // 1. 处理所有待处理的切换请求
        loop {
            match toggle_rx.try_recv() {
                Ok(request) => {
                    let result = garage.toggle(request.kind);
                    match request.reply {
                        Some(reply) => {
                            let _ = reply.try_send(result);
                        },
                        None => {
                            if let Err(e) = result {
                                warn!("Toggle {} failed: {}", request.kind, e);
                            }
                        },
                    }
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("Toggle channel disconnected, stopping IO loop");
                    break 'outer;
                },
            }
        }

        // 2. 驱动解码器
        match garage.loop_once() {
            Ok(report) => {
                ctx.rx_bytes
                    .fetch_add(report.received as u64, Ordering::Relaxed);
                ctx.tx_bytes.fetch_add(report.sent as u64, Ordering::Relaxed);
                if !report.changes.is_empty() {
                    ctx.state.store(Arc::new(garage.state()));
                }
            },
            Err(DriverError::Serial(e)) if e.is_fatal() => {
                error!("Fatal serial error, stopping IO loop: {}", e);
                break;
            },
            Err(e) => warn!("IO loop error: {}", e),
        }

        // 3. 发送切换序列期间提高轮询频率
        if garage.scan_rate().is_high() {
            spin_sleep::sleep(fast_interval);
        } else {
            spin_sleep::sleep(interval);
        }
    }

    ctx.is_running.store(false, Ordering::Release);
    info!("IO loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonotonicClock;
    use crossbeam_channel::bounded;
    use garage_serial::MockSerialAdapter;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.loop_interval_ms, 16);
        assert_eq!(config.fast_loop_interval_ms, 1);
        assert_eq!(config.join_timeout_ms, 500);
    }

    #[test]
    fn test_io_loop_exits_on_disconnect() {
        let (adapter, _bus) = MockSerialAdapter::new();
        let garage = GarageDoor::new(adapter, MonotonicClock::new());
        let (tx, rx) = bounded::<ToggleRequest>(4);
        let ctx = Arc::new(DriverContext::new());

        drop(tx);
        io_loop(garage, rx, ctx.clone(), PipelineConfig::default());
        assert!(!ctx.is_running.load(Ordering::Acquire));
    }

    #[test]
    fn test_io_loop_exits_on_fatal_serial_error() {
        let (adapter, bus) = MockSerialAdapter::new();
        let garage = GarageDoor::new(adapter, MonotonicClock::new());
        let (_tx, rx) = bounded::<ToggleRequest>(4);
        let ctx = Arc::new(DriverContext::new());

        bus.disconnect();
        io_loop(garage, rx, ctx.clone(), PipelineConfig::default());
        assert!(!ctx.is_running.load(Ordering::Acquire));
    }

    #[test]
    fn test_io_loop_processes_toggle_and_publishes() {
        let (adapter, bus) = MockSerialAdapter::new();
        let garage = GarageDoor::new(adapter, MonotonicClock::new());
        let (tx, rx) = bounded::<ToggleRequest>(4);
        let ctx = Arc::new(DriverContext::new());

        let (reply_tx, reply_rx) = bounded(1);
        tx.send(ToggleRequest {
            kind: ToggleKind::Lock,
            reply: Some(reply_tx),
        })
        .unwrap();
        bus.inject(&[0x3a, 0x55]);

        let ctx_clone = ctx.clone();
        let handle = std::thread::spawn(move || {
            io_loop(garage, rx, ctx_clone, PipelineConfig::default());
        });

        let outcome = reply_rx
            .recv_timeout(Duration::from_secs(1))
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, ToggleOutcome::Started { .. }));

        // 等待整个序列写完（最多 100 + 240ms）
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while bus.written().len() < 3 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(bus.written(), vec![0x34, 0x35, 0x35]);

        let state = ctx.state.load();
        assert_eq!(state.light_on, Some(true));
        assert_eq!(state.door_locked, Some(true));

        drop(tx);
        handle.join().unwrap();
        assert_eq!(ctx.tx_bytes.load(Ordering::Relaxed), 3);
        assert_eq!(ctx.rx_bytes.load(Ordering::Relaxed), 2);
    }
}
