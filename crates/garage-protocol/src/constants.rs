//! 协议常量定义
//!
//! 集中定义所有时序和掩码常量，避免在代码中散落"魔法数"。

/// 输入历史（环形缓冲区）长度
///
/// 每次重新扫描都只看最近的 5 个字节。
pub const HISTORY_LEN: usize = 5;

/// 请求到应答的最大间隔（毫秒）
///
/// 超过此间隔的请求/应答对被丢弃，不更新任何状态。
pub const MAX_RESPONSE_DELAY_MS: u64 = 100;

/// 冲突回避：回看窗口（毫秒）
///
/// 如果最近一个字节在此窗口内到达，认为总线上可能仍有数据在传输。
pub const COLLISION_LOOKBACK_MS: u64 = 200;

/// 冲突回避：延迟发送的起始偏移（毫秒）
pub const COLLISION_START_DELAY_MS: u64 = 100;

/// 默认串口波特率
pub const DEFAULT_BAUD_RATE: u32 = 1200;

// ============================================================================
// 灯光/门锁应答掩码
// ============================================================================
//
// 高 4 位固定为 0x5
// 低 4 位: <unlocked>:<light_on>:0:1

/// 灯光状态掩码（先掩码再查表）
pub const LIGHT_STATE_MASK: u8 = 0xf7;

/// 门锁状态掩码（先掩码再查表）
pub const LOCK_STATE_MASK: u8 = 0xfb;
