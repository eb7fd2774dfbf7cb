//! 总线字节常量定义和分类
//!
//! 定义墙面按钮发出的查询请求字节，并提供字节分类功能。

use crate::ProtocolError;
use crate::toggle::ToggleKind;
use num_enum::{IntoPrimitive, TryFromPrimitive};

// ============================================================================
// 请求字节常量（按钮 -> 开门器）
// ============================================================================

/// 查询门状态
pub const CMD_DOOR_STATE: u8 = 0x38;

/// 查询红外对射（障碍物传感器）状态
pub const CMD_EYE_SENSOR_STATE: u8 = 0x39;

/// 查询灯光与门锁状态
pub const CMD_LIGHT_AND_LOCK_STATE: u8 = 0x3a;

/// 查询请求
///
/// 每个请求之后紧跟开门器的一个应答字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Command {
    DoorState = 0x38,
    EyeSensorState = 0x39,
    LightAndLockState = 0x3a,
}

impl Command {
    /// 从请求字节解析
    pub fn decode(byte: u8) -> Result<Self, ProtocolError> {
        Self::try_from(byte).map_err(|_| ProtocolError::UnknownCommand(byte))
    }
}

// ============================================================================
// 字节分类
// ============================================================================

/// 单个总线字节的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteKind {
    /// 查询请求（后面应跟一个应答字节）
    Command(Command),
    /// 切换序列首字节
    ToggleStart(ToggleKind),
    /// 其它（应答字节、序列后续字节或噪声）
    Other,
}

impl ByteKind {
    /// 判断字节类型
    pub fn classify(byte: u8) -> Self {
        if let Ok(command) = Command::try_from(byte) {
            return ByteKind::Command(command);
        }
        match ToggleKind::from_first_byte(byte) {
            Some(kind) => ByteKind::ToggleStart(kind),
            None => ByteKind::Other,
        }
    }
}
