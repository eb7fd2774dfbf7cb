//! 切换序列定义
//!
//! 墙面按钮每按一次，会在总线上发出 3 个字节。发送端按固定间隔写出这 3 个字节，
//! 开门器收到后切换门/灯/锁的状态，随后的查询应答会反映新状态。

/// 模拟一次按键的三字节序列及其时序
///
/// `delay2_ms` 为 byte1 → byte2 的间隔，`delay3_ms` 为 byte2 → byte3 的间隔。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToggleSequence {
    pub byte1: u8,
    pub byte2: u8,
    pub byte3: u8,
    pub delay2_ms: u16,
    pub delay3_ms: u16,
}

impl ToggleSequence {
    /// 三个字节（按发送顺序）
    pub const fn bytes(&self) -> [u8; 3] {
        [self.byte1, self.byte2, self.byte3]
    }

    /// 第 `step` 个字节（0..3）相对 byte1 的发送偏移（毫秒）
    ///
    /// `step` 超出范围时返回 `None`。
    pub const fn offset_ms(&self, step: usize) -> Option<u64> {
        match step {
            0 => Some(0),
            1 => Some(self.delay2_ms as u64),
            2 => Some(self.delay2_ms as u64 + self.delay3_ms as u64),
            _ => None,
        }
    }

    /// 第 `step` 个字节
    pub const fn byte(&self, step: usize) -> Option<u8> {
        match step {
            0 => Some(self.byte1),
            1 => Some(self.byte2),
            2 => Some(self.byte3),
            _ => None,
        }
    }
}

/// 切换门
pub const TOGGLE_DOOR: ToggleSequence = ToggleSequence {
    byte1: 0x30,
    byte2: 0x31,
    byte3: 0x31,
    delay2_ms: 220,
    delay3_ms: 20,
};

/// 切换灯
pub const TOGGLE_LIGHT: ToggleSequence = ToggleSequence {
    byte1: 0x32,
    byte2: 0x33,
    byte3: 0x33,
    delay2_ms: 220,
    delay3_ms: 20,
};

/// 切换锁
pub const TOGGLE_LOCK: ToggleSequence = ToggleSequence {
    byte1: 0x34,
    byte2: 0x35,
    byte3: 0x35,
    delay2_ms: 220,
    delay3_ms: 20,
};

/// 可切换的对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ToggleKind {
    Door,
    Light,
    Lock,
}

impl ToggleKind {
    /// 所有切换对象（按首字节升序）
    pub const ALL: [ToggleKind; 3] = [ToggleKind::Door, ToggleKind::Light, ToggleKind::Lock];

    /// 对应的序列常量
    pub const fn sequence(self) -> ToggleSequence {
        match self {
            ToggleKind::Door => TOGGLE_DOOR,
            ToggleKind::Light => TOGGLE_LIGHT,
            ToggleKind::Lock => TOGGLE_LOCK,
        }
    }

    /// 根据序列首字节查找切换对象
    pub fn from_first_byte(byte: u8) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.sequence().byte1 == byte)
    }

    pub const fn name(self) -> &'static str {
        match self {
            ToggleKind::Door => "door",
            ToggleKind::Light => "light",
            ToggleKind::Lock => "lock",
        }
    }
}

impl std::fmt::Display for ToggleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}
