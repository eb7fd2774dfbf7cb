//! 驱动句柄
//!
//! 提供对外的 [`GarageDoorDriver`]，封装后台 IO 线程和状态同步细节。

use crate::clock::Clock;
use crate::error::DriverError;
use crate::garage::GarageDoor;
use crate::hooks::{BusCallback, HookManager};
use crate::pipeline::{DriverContext, PipelineConfig, ToggleRequest, io_loop};
use crate::scan_rate::AtomicScanRate;
use crate::sequencer::ToggleOutcome;
use crate::state::{Channel, DoorState};
use crossbeam_channel::{Sender, TrySendError, bounded};
use garage_protocol::ToggleKind;
use garage_serial::SerialAdapter;
use std::sync::atomic::Ordering;
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, warn};

/// 切换请求通道容量
const TOGGLE_CHANNEL_CAPACITY: usize = 4;

/// Extension trait for timeout-capable thread joins
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();

        // Watchdog thread joins the target thread
        std::thread::spawn(move || {
            let result = self.join();
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "Thread panicked during join",
            ))),
        }
    }
}

/// 车库门驱动（对外 API）
///
/// 后台 IO 线程独占串口与解码器；句柄通过有界通道提交切换请求，
/// 通过 `ArcSwap` 无锁读取最新状态。Drop 时通知 IO 线程退出并等待（带超时）。
pub struct GarageDoorDriver {
    /// 切换请求发送端（Drop 时先关闭，IO 线程收到 Disconnected 后退出）
    toggle_tx: Option<Sender<ToggleRequest>>,
    ctx: Arc<DriverContext>,
    hooks: Arc<RwLock<HookManager>>,
    scan_rate: AtomicScanRate,
    io_thread: Option<JoinHandle<()>>,
    join_timeout: Duration,
    /// 串口名称（仅用于日志和录制元数据）
    port: String,
}

impl GarageDoorDriver {
    /// 启动 IO 线程
    ///
    /// # 参数
    /// - `adapter`: 串口适配器（移动到 IO 线程）
    /// - `clock`: 时钟（移动到 IO 线程）
    /// - `config`: Pipeline 配置（可选）
    ///
    /// # 错误
    /// - `DriverError::IoThread`: 线程创建失败
    pub fn new<A, C>(
        adapter: A,
        clock: C,
        config: Option<PipelineConfig>,
    ) -> Result<Self, DriverError>
    where
        A: SerialAdapter + Send + 'static,
        C: Clock + Send + 'static,
    {
        let config = config.unwrap_or_default();
        let (toggle_tx, toggle_rx) = bounded(TOGGLE_CHANNEL_CAPACITY);
        let ctx = Arc::new(DriverContext::new());
        let hooks = Arc::new(RwLock::new(HookManager::new()));
        let scan_rate = AtomicScanRate::new();

        let garage =
            GarageDoor::with_scan_rate(adapter, clock, scan_rate.clone()).with_hooks(hooks.clone());
        let join_timeout = Duration::from_millis(config.join_timeout_ms);

        let ctx_clone = ctx.clone();
        let io_thread = std::thread::Builder::new()
            .name("garage-io".to_string())
            .spawn(move || io_loop(garage, toggle_rx, ctx_clone, config))
            .map_err(|e| DriverError::IoThread(e.to_string()))?;

        Ok(Self {
            toggle_tx: Some(toggle_tx),
            ctx,
            hooks,
            scan_rate,
            io_thread: Some(io_thread),
            join_timeout,
            port: "unknown".to_string(),
        })
    }

    /// 设置元数据（由 Builder 调用）
    pub(crate) fn with_port_name(mut self, port: String) -> Self {
        self.port = port;
        self
    }

    /// 最新发布的状态（无锁）
    pub fn state(&self) -> DoorState {
        **self.ctx.state.load()
    }

    /// 请求一次切换（不等待结果）
    ///
    /// # 错误
    /// - `DriverError::ChannelFull`: 请求通道已满
    /// - `DriverError::ChannelClosed`: IO 线程已退出
    pub fn toggle(&self, kind: ToggleKind) -> Result<(), DriverError> {
        self.send_request(ToggleRequest { kind, reply: None })
    }

    /// 请求一次切换并等待发送器的处理结果
    ///
    /// 只等待请求被接受（开始或排队），不等待序列写完。
    ///
    /// # 错误
    /// - `DriverError::ToggleBusy`: 已有序列在发送且另一个在排队
    /// - `DriverError::Timeout`: IO 线程未在 `timeout` 内应答
    pub fn toggle_blocking(
        &self,
        kind: ToggleKind,
        timeout: Duration,
    ) -> Result<ToggleOutcome, DriverError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send_request(ToggleRequest {
            kind,
            reply: Some(reply_tx),
        })?;
        match reply_rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => Err(DriverError::Timeout),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                Err(DriverError::ChannelClosed)
            },
        }
    }

    /// 写开关：不论请求的值都发出一次切换，不乐观发布
    ///
    /// 只读通道（红外对射）被忽略。
    pub fn write_switch(&self, channel: Channel, requested: bool) -> Result<(), DriverError> {
        let Some(kind) = channel.toggle_kind() else {
            warn!("Channel {} is read-only, ignoring write", channel);
            return Ok(());
        };
        if self.state().get(channel) == Some(requested) {
            warn!("{} already {}, toggling anyway", channel, requested);
        }
        self.toggle(kind)
    }

    fn send_request(&self, request: ToggleRequest) -> Result<(), DriverError> {
        let Some(tx) = self.toggle_tx.as_ref() else {
            return Err(DriverError::ChannelClosed);
        };
        match tx.try_send(request) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(DriverError::ChannelFull),
            Err(TrySendError::Disconnected(_)) => Err(DriverError::ChannelClosed),
        }
    }

    /// 添加回调（在 IO 线程中触发）
    pub fn add_callback(&self, callback: Arc<dyn BusCallback>) {
        if let Ok(mut hooks) = self.hooks.write() {
            hooks.add_callback(callback);
        }
    }

    /// 钩子管理器
    pub fn hooks(&self) -> Arc<RwLock<HookManager>> {
        self.hooks.clone()
    }

    /// IO 线程是否仍在运行
    pub fn is_running(&self) -> bool {
        self.ctx.is_running.load(Ordering::Acquire)
    }

    /// 是否正在高频扫描（切换序列发送中）
    pub fn is_fast_scanning(&self) -> bool {
        self.scan_rate.is_high()
    }

    /// 累计收发字节数 (rx, tx)
    pub fn byte_counts(&self) -> (u64, u64) {
        (
            self.ctx.rx_bytes.load(Ordering::Relaxed),
            self.ctx.tx_bytes.load(Ordering::Relaxed),
        )
    }

    /// 串口名称
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl Drop for GarageDoorDriver {
    fn drop(&mut self) {
        self.ctx.is_running.store(false, Ordering::Release);

        // 先关闭请求通道，IO 线程收到 Disconnected 也会退出
        self.toggle_tx.take();

        if let Some(handle) = self.io_thread.take()
            && let Err(_e) = handle.join_timeout(self.join_timeout)
        {
            error!(
                "IO thread panicked or failed to shut down within {:?}",
                self.join_timeout
            );
        }
    }
}
