//! 输入历史（环形缓冲区）
//!
//! 保存最近 [`HISTORY_LEN`] 个带时间戳的总线字节。纯存储，不含任何解析逻辑。
//!
//! # 索引约定
//!
//! 写计数器 `w` 单调递增，第 `i` 次写入落在槽位 `i % HISTORY_LEN`。
//! 全局索引 `i` 只有在 `[w - HISTORY_LEN, w)` 范围内才指向仍然存活的条目；
//! 超出范围的读取会静默返回旧数据，由调用方保证索引范围。

use garage_protocol::HISTORY_LEN;

/// 带时间戳的总线字节
///
/// `timestamp_ms == 0` 表示该槽位从未写入过。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RingEntry {
    /// 接收时间（单调时钟，毫秒）
    pub timestamp_ms: u64,
    /// 字节值
    pub byte: u8,
}

impl RingEntry {
    /// 空槽位
    pub const EMPTY: RingEntry = RingEntry {
        timestamp_ms: 0,
        byte: 0,
    };

    pub const fn new(byte: u8, timestamp_ms: u64) -> Self {
        Self { timestamp_ms, byte }
    }

    /// 是否为空槽位
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.timestamp_ms == 0
    }
}

/// 扫描窗口：按时间从旧到新排列的 5 个条目
pub type Window = [RingEntry; HISTORY_LEN];

/// 输入历史
#[derive(Debug, Clone, Default)]
pub struct InputHistory {
    entries: [RingEntry; HISTORY_LEN],
    /// 写计数器（下一次写入的全局索引）
    next: usize,
}

impl InputHistory {
    pub const CAPACITY: usize = HISTORY_LEN;

    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个字节，覆盖最旧的条目
    #[inline]
    pub fn push(&mut self, byte: u8, timestamp_ms: u64) {
        self.entries[self.next % HISTORY_LEN] = RingEntry::new(byte, timestamp_ms);
        self.next += 1;
    }

    /// 按全局索引读取（`index % HISTORY_LEN`）
    #[inline]
    pub fn get(&self, index: usize) -> RingEntry {
        self.entries[index % HISTORY_LEN]
    }

    /// 累计写入次数
    pub fn write_count(&self) -> usize {
        self.next
    }

    /// 当前窗口中最旧条目的全局索引
    ///
    /// 等于写计数器本身：`w` 与 `w - HISTORY_LEN` 落在同一个槽位，
    /// 它也是下一次写入将要覆盖的槽位。
    pub fn oldest_index(&self) -> usize {
        self.next
    }

    /// 从全局索引 `ptr` 开始复制 5 个连续条目
    pub fn window(&self, ptr: usize) -> Window {
        std::array::from_fn(|i| self.get(ptr + i))
    }

    /// 最近 5 次写入组成的窗口（从旧到新）
    pub fn latest_window(&self) -> Window {
        self.window(self.oldest_index())
    }

    /// 最近一次写入的条目
    pub fn newest(&self) -> Option<RingEntry> {
        if self.next == 0 {
            return None;
        }
        Some(self.get(self.next - 1))
    }
}
