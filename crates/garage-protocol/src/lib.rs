//! # Garage Protocol
//!
//! 车库门开门器与墙面按钮之间串口总线的协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `ids`: 总线字节常量与字节分类
//! - `constants`: 时序与掩码常量
//! - `response`: 应答字节解码表
//! - `toggle`: 模拟按键的三字节切换序列
//!
//! ## 帧格式
//!
//! 总线上没有帧头和长度字段，每个字节独立到达：
//!
//! ```text
//! 查询帧:  [请求字节 0x38..=0x3A] --(≤100ms)--> [应答字节]
//! 切换序列: [byte1] --220ms--> [byte2] --20ms--> [byte3]
//! ```
//!
//! 上层需要根据到达时间戳把字节重新组合成帧。

pub mod constants;
pub mod ids;
pub mod response;
pub mod toggle;

// 重新导出常用类型
pub use constants::*;
pub use ids::*;
pub use response::*;
pub use toggle::*;

use thiserror::Error;

/// 协议解析错误类型
///
/// 解码表只会返回这些错误，调用方（解释器）负责把它们降级为日志。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown command code: 0x{0:02x}")]
    UnknownCommand(u8),

    #[error("Unknown value for field {field}: 0x{masked:02x}/0x{raw:02x}")]
    UnknownValue {
        field: &'static str,
        masked: u8,
        raw: u8,
    },
}

impl ProtocolError {
    /// 原始字节（未掩码）
    pub fn raw(&self) -> u8 {
        match self {
            ProtocolError::UnknownCommand(raw) => *raw,
            ProtocolError::UnknownValue { raw, .. } => *raw,
        }
    }
}
