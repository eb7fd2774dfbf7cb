//! 单调时钟
//!
//! 解码器只关心相对时间（毫秒）。真实运行使用以进程启动为锚点的单调时钟，
//! 测试和离线回放使用可手动推进的时钟。

use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global anchor point for monotonic time
static APP_START: OnceLock<Instant> = OnceLock::new();

/// 时钟接口（毫秒）
///
/// 返回值必须单调不减，且不能为 0（0 在输入历史里表示空槽位）。
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// 以进程启动为锚点的单调时钟
///
/// 不受系统时间调整（NTP、手动修改）影响。
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        // 提前初始化锚点，避免第一次读数落在 0ms
        APP_START.get_or_init(Instant::now);
        Self
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        let start = APP_START.get_or_init(Instant::now);
        // +1: 保证永不返回 0
        start.elapsed().as_millis() as u64 + 1
    }
}

/// 手动时钟（测试、离线回放）
///
/// 克隆共享同一个计数器，测试代码可以在驱动持有时钟的同时推进时间。
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// 创建时钟，`start_ms` 为 0 时按 1 处理
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms.max(1))),
        }
    }

    /// 设置当前时间（不允许倒退）
    pub fn set(&self, now_ms: u64) {
        self.now.fetch_max(now_ms, Ordering::Relaxed);
    }

    /// 推进时间
    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::Relaxed);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}
