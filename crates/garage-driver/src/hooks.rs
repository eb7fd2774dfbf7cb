//! 钩子系统（Hook System）
//!
//! 在状态发布、字节收发时触发自定义回调。
//!
//! - **非阻塞**: 回调运行在 IO 线程中，耗时操作应通过 Channel 转交其它线程
//! - **职责分离**: HookManager 管理运行时回调，PipelineConfig 保持为 POD 数据
//!
//! # 使用示例
//!
//! ```rust
//! use garage_driver::hooks::{BusCallback, HookManager};
//! use garage_driver::state::Channel;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl BusCallback for Printer {
//!     fn on_state_changed(&self, channel: Channel, value: bool) {
//!         println!("{} -> {}", channel, value);
//!     }
//! }
//!
//! let mut hooks = HookManager::new();
//! hooks.add_callback(Arc::new(Printer));
//! hooks.trigger_state(Channel::Door, true);
//! ```

use crate::state::Channel;
use std::sync::Arc;

/// 总线回调 Trait
///
/// 只有 `on_state_changed` 必须实现；字节级回调默认为空操作，仅录制时需要。
pub trait BusCallback: Send + Sync {
    /// 某个通道的状态发生变化（已经过去重）
    fn on_state_changed(&self, channel: Channel, value: bool);

    /// 收到一个总线字节
    fn on_byte_received(&self, timestamp_ms: u64, byte: u8) {
        let _ = (timestamp_ms, byte);
    }

    /// 本端成功写出一个字节
    ///
    /// 仅在 `write_byte()` 成功后触发。
    fn on_byte_sent(&self, timestamp_ms: u64, byte: u8) {
        let _ = (timestamp_ms, byte);
    }
}

/// 钩子管理器
///
/// 回调列表本身不是线程安全的，需要外部同步（通常通过 `RwLock<HookManager>`）。
#[derive(Default)]
pub struct HookManager {
    callbacks: Vec<Arc<dyn BusCallback>>,
}

impl std::fmt::Debug for HookManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookManager")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl HookManager {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    pub fn add_callback(&mut self, callback: Arc<dyn BusCallback>) {
        self.callbacks.push(callback);
    }

    /// 移除所有回调
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// 触发状态变化回调
    pub fn trigger_state(&self, channel: Channel, value: bool) {
        for callback in self.callbacks.iter() {
            callback.on_state_changed(channel, value);
        }
    }

    /// 触发 RX 回调
    pub fn trigger_received(&self, timestamp_ms: u64, byte: u8) {
        for callback in self.callbacks.iter() {
            callback.on_byte_received(timestamp_ms, byte);
        }
    }

    /// 触发 TX 回调（写出成功后调用）
    pub fn trigger_sent(&self, timestamp_ms: u64, byte: u8) {
        for callback in self.callbacks.iter() {
            callback.on_byte_sent(timestamp_ms, byte);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{Sender, bounded};
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Debug)]
    struct TestCallback {
        tx: Sender<(Channel, bool)>,
        bytes: Arc<AtomicU64>,
    }

    impl BusCallback for TestCallback {
        fn on_state_changed(&self, channel: Channel, value: bool) {
            let _ = self.tx.try_send((channel, value));
        }

        fn on_byte_received(&self, _timestamp_ms: u64, _byte: u8) {
            self.bytes.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_hook_manager_add_and_clear() {
        let mut hooks = HookManager::new();
        assert!(hooks.is_empty());

        let (tx, _rx) = bounded(10);
        let bytes = Arc::new(AtomicU64::new(0));
        hooks.add_callback(Arc::new(TestCallback { tx, bytes }));
        assert_eq!(hooks.len(), 1);

        hooks.clear();
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_hook_manager_trigger() {
        let mut hooks = HookManager::new();
        let (tx, rx) = bounded(10);
        let bytes = Arc::new(AtomicU64::new(0));
        hooks.add_callback(Arc::new(TestCallback {
            tx,
            bytes: bytes.clone(),
        }));

        hooks.trigger_state(Channel::Light, true);
        assert_eq!(rx.try_recv().unwrap(), (Channel::Light, true));

        hooks.trigger_received(10, 0x38);
        hooks.trigger_received(20, 0x52);
        assert_eq!(bytes.load(Ordering::Relaxed), 2);

        // TX 回调使用默认实现，不计数
        hooks.trigger_sent(30, 0x30);
        assert_eq!(bytes.load(Ordering::Relaxed), 2);
        assert!(rx.try_recv().is_err());
    }
}
