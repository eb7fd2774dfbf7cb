//! 应答字节解码表
//!
//! 开门器对每个查询请求回一个字节。门状态、对射状态直接查表；
//! 灯光与门锁共用一个字节，分别用掩码取出后再查表。

use crate::ProtocolError;
use crate::constants::{LIGHT_STATE_MASK, LOCK_STATE_MASK};
use num_enum::{IntoPrimitive, TryFromPrimitive};

// ============================================================================
// 门状态（应答 0x38）
// ============================================================================

/// 门状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DoorStatus {
    /// 正在开门
    Opening = 0x01,
    /// 正在关门
    Closing = 0x04,
    /// 停在开/关之间，不在运动
    Stopped = 0x06,
    /// 已关闭
    Closed = 0x55,
    /// 已打开
    Open = 0x52,
}

impl DoorStatus {
    pub fn decode(raw: u8) -> Result<Self, ProtocolError> {
        Self::try_from(raw).map_err(|_| ProtocolError::UnknownValue {
            field: "door",
            masked: raw,
            raw,
        })
    }

    /// 折叠为开/关两态
    ///
    /// `Closing` 和 `Closed` 视为关闭，其余（包括 `Stopped`）视为打开。
    pub fn is_open(self) -> bool {
        match self {
            DoorStatus::Closing | DoorStatus::Closed => false,
            DoorStatus::Opening | DoorStatus::Stopped | DoorStatus::Open => true,
        }
    }
}

// ============================================================================
// 红外对射状态（应答 0x39）
// ============================================================================

/// 红外对射（障碍物传感器）状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EyeSensorStatus {
    Clear = 0x00,
    Blocked = 0x04,
}

impl EyeSensorStatus {
    pub fn decode(raw: u8) -> Result<Self, ProtocolError> {
        Self::try_from(raw).map_err(|_| ProtocolError::UnknownValue {
            field: "eye_sensor",
            masked: raw,
            raw,
        })
    }

    pub fn is_blocked(self) -> bool {
        self == EyeSensorStatus::Blocked
    }
}

// ============================================================================
// 灯光与门锁状态（应答 0x3A）
// ============================================================================

/// 灯光状态（必须先用 `LIGHT_STATE_MASK` 掩码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum LightStatus {
    On = 0x55,
    Off = 0x51,
}

impl LightStatus {
    /// 从原始应答字节解码（内部先做掩码）
    pub fn decode(raw: u8) -> Result<Self, ProtocolError> {
        let masked = raw & LIGHT_STATE_MASK;
        Self::try_from(masked).map_err(|_| ProtocolError::UnknownValue {
            field: "light",
            masked,
            raw,
        })
    }

    pub fn is_on(self) -> bool {
        self == LightStatus::On
    }
}

/// 门锁状态（必须先用 `LOCK_STATE_MASK` 掩码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum LockStatus {
    Unlocked = 0x59,
    Locked = 0x51,
}

impl LockStatus {
    /// 从原始应答字节解码（内部先做掩码）
    pub fn decode(raw: u8) -> Result<Self, ProtocolError> {
        let masked = raw & LOCK_STATE_MASK;
        Self::try_from(masked).map_err(|_| ProtocolError::UnknownValue {
            field: "lock",
            masked,
            raw,
        })
    }

    pub fn is_locked(self) -> bool {
        self == LockStatus::Locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_door_status_decode() {
        assert_eq!(DoorStatus::decode(0x01), Ok(DoorStatus::Opening));
        assert_eq!(DoorStatus::decode(0x04), Ok(DoorStatus::Closing));
        assert_eq!(DoorStatus::decode(0x06), Ok(DoorStatus::Stopped));
        assert_eq!(DoorStatus::decode(0x55), Ok(DoorStatus::Closed));
        assert_eq!(DoorStatus::decode(0x52), Ok(DoorStatus::Open));
        assert!(DoorStatus::decode(0x5b).is_err());
    }

    #[test]
    fn test_door_collapse() {
        assert!(!DoorStatus::Closing.is_open());
        assert!(!DoorStatus::Closed.is_open());
        assert!(DoorStatus::Opening.is_open());
        assert!(DoorStatus::Stopped.is_open());
        assert!(DoorStatus::Open.is_open());
    }

    #[test]
    fn test_eye_sensor_decode() {
        assert_eq!(EyeSensorStatus::decode(0x00), Ok(EyeSensorStatus::Clear));
        assert_eq!(EyeSensorStatus::decode(0x04), Ok(EyeSensorStatus::Blocked));
        assert!(EyeSensorStatus::Blocked.is_blocked());
        assert!(!EyeSensorStatus::Clear.is_blocked());
        assert_eq!(
            EyeSensorStatus::decode(0x02),
            Err(ProtocolError::UnknownValue {
                field: "eye_sensor",
                masked: 0x02,
                raw: 0x02
            })
        );
    }

    #[test]
    fn test_light_and_lock_share_byte() {
        // 0x59: 0x59 & 0xf7 = 0x51 (Off), 0x59 & 0xfb = 0x59 (Unlocked)
        assert_eq!(LightStatus::decode(0x59), Ok(LightStatus::Off));
        assert_eq!(LockStatus::decode(0x59), Ok(LockStatus::Unlocked));

        // 0x5d: 灯亮 + 未锁
        assert_eq!(LightStatus::decode(0x5d), Ok(LightStatus::On));
        assert_eq!(LockStatus::decode(0x5d), Ok(LockStatus::Unlocked));

        // 0x55: 灯亮 + 已锁
        assert_eq!(LightStatus::decode(0x55), Ok(LightStatus::On));
        assert_eq!(LockStatus::decode(0x55), Ok(LockStatus::Locked));

        // 0x51: 灯灭 + 已锁
        assert_eq!(LightStatus::decode(0x51), Ok(LightStatus::Off));
        assert_eq!(LockStatus::decode(0x51), Ok(LockStatus::Locked));
    }

    #[test]
    fn test_light_lock_unknown_values() {
        // 0x53: 灯光掩码后 0x53（未知），门锁掩码后 0x53（未知）
        assert!(LightStatus::decode(0x53).is_err());
        assert!(LockStatus::decode(0x53).is_err());

        let err = LightStatus::decode(0x58).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnknownValue {
                field: "light",
                masked: 0x50,
                raw: 0x58
            }
        );
        // 0x58 & 0xfb = 0x58，门锁同样未知
        assert!(LockStatus::decode(0x58).is_err());
    }
}
