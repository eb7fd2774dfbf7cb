//! 扫描频率请求
//!
//! 切换序列发送期间，IO 循环需要以更高频率轮询，才能按时写出后续字节。
//! 发送方通过 [`ScanRate`] 提出/撤销"高频扫描"请求，IO 循环据此选择睡眠间隔。

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// 扫描频率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ScanRate {
    /// 正常频率（默认）
    #[default]
    Normal = 0,

    /// 高频扫描（切换序列发送中）
    High = 1,
}

impl ScanRate {
    /// 从 u8 转换，无效值返回 Normal
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::High,
            _ => Self::Normal,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_high(self) -> bool {
        self == Self::High
    }
}

/// 扫描频率（原子版本，IO 循环与序列发送器共享）
///
/// # 示例
///
/// ```rust
/// use garage_driver::scan_rate::{AtomicScanRate, ScanRate};
///
/// let rate = AtomicScanRate::new();
/// rate.request_high();
/// assert_eq!(rate.get(), ScanRate::High);
/// rate.release();
/// assert_eq!(rate.get(), ScanRate::Normal);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AtomicScanRate {
    inner: Arc<AtomicU8>,
}

impl AtomicScanRate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前扫描频率
    pub fn get(&self) -> ScanRate {
        ScanRate::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// 请求高频扫描
    pub fn request_high(&self) {
        self.inner.store(ScanRate::High.as_u8(), Ordering::Release);
    }

    /// 撤销高频扫描请求
    pub fn release(&self) {
        self.inner.store(ScanRate::Normal.as_u8(), Ordering::Release);
    }

    pub fn is_high(&self) -> bool {
        self.get().is_high()
    }
}
