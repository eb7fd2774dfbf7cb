//! 切换序列确认
//!
//! 窗口首个字节是某个切换序列的 byte1 时，在窗口中寻找匹配的 byte2/byte3。
//! 总线上可能出现两种排列：
//!
//! ```text
//! 相邻: [byte1] ... [byte2][byte3]            (byte2 位于 1..=3)
//! 间隔: [byte1] [byte2] [cmd] [resp] [byte3]  (查询帧插在 byte2 与 byte3 之间)
//! ```
//!
//! 确认结果仅用于诊断，不会改变任何解码状态。

use crate::history::Window;
use garage_protocol::{HISTORY_LEN, ToggleSequence};
use tracing::{error, info};

/// 切换序列确认结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleMatch {
    /// byte3 紧跟 byte2
    Adjacent {
        /// byte2 在窗口中的位置
        index: usize,
        /// byte2 - byte1（毫秒）
        delta2_ms: u64,
        /// byte3 - byte2（毫秒）
        delta3_ms: u64,
    },
    /// byte2 与 byte3 之间夹着一个查询帧
    Gapped {
        index: usize,
        delta2_ms: u64,
        delta3_ms: u64,
    },
    /// 两种排列都不匹配
    NotFound,
}

impl ToggleMatch {
    pub fn is_confirmed(&self) -> bool {
        !matches!(self, ToggleMatch::NotFound)
    }

    /// (byte2 - byte1, byte3 - byte2)
    pub fn deltas(&self) -> Option<(u64, u64)> {
        match *self {
            ToggleMatch::Adjacent {
                delta2_ms,
                delta3_ms,
                ..
            }
            | ToggleMatch::Gapped {
                delta2_ms,
                delta3_ms,
                ..
            } => Some((delta2_ms, delta3_ms)),
            ToggleMatch::NotFound => None,
        }
    }
}

/// 在窗口中确认切换序列（窗口第 0 个字节已匹配 byte1）
///
/// 先查相邻排列，再查间隔排列，先匹配者胜出。
pub fn confirm_toggle(window: &Window, sequence: &ToggleSequence) -> ToggleMatch {
    let start = window[0].timestamp_ms;
    let deltas = |i2: usize, i3: usize| {
        let data2 = window[i2];
        let data3 = window[i3];
        let delta2_ms = data2.timestamp_ms.saturating_sub(start);
        let delta3_ms = data3.timestamp_ms.saturating_sub(data2.timestamp_ms);
        info!(
            "ToggleSequence timings: (data2-data1)={}ms (data3-data2)={}ms",
            delta2_ms, delta3_ms
        );
        (delta2_ms, delta3_ms)
    };

    for i in 1..HISTORY_LEN - 1 {
        if window[i].byte == sequence.byte2 && window[i + 1].byte == sequence.byte3 {
            let (delta2_ms, delta3_ms) = deltas(i, i + 1);
            return ToggleMatch::Adjacent {
                index: i,
                delta2_ms,
                delta3_ms,
            };
        }
    }

    for i in 1..HISTORY_LEN - 3 {
        if window[i].byte == sequence.byte2 && window[i + 3].byte == sequence.byte3 {
            let (delta2_ms, delta3_ms) = deltas(i, i + 3);
            return ToggleMatch::Gapped {
                index: i,
                delta2_ms,
                delta3_ms,
            };
        }
    }

    error!(
        "Toggle sequence not found: 0x{:02x} 0x{:02x} 0x{:02x}",
        sequence.byte1, sequence.byte2, sequence.byte3
    );
    dump_window(window);
    ToggleMatch::NotFound
}

/// 以 error 级别打印整个窗口（索引、字节、相对窗口起点的毫秒数）
pub fn dump_window(window: &Window) {
    let start = window[0].timestamp_ms;
    for (i, entry) in window.iter().enumerate() {
        error!(
            "Input[{}]: 0x{:02x} ({}ms)",
            i,
            entry.byte,
            entry.timestamp_ms.saturating_sub(start)
        );
    }
}
