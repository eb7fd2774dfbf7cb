//! 对外发布的状态
//!
//! 四个通道：门、灯、锁三个开关，以及只读的红外对射传感器。

use garage_protocol::ToggleKind;

/// 状态通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Door,
    Light,
    Lock,
    EyeSensor,
}

impl Channel {
    /// 所有通道（发布顺序）
    pub const ALL: [Channel; 4] = [
        Channel::Door,
        Channel::Light,
        Channel::EyeSensor,
        Channel::Lock,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Channel::Door => "door",
            Channel::Light => "light",
            Channel::Lock => "lock",
            Channel::EyeSensor => "eye_sensor",
        }
    }

    /// 从名称解析（CLI 使用）
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// 开关通道对应的切换对象，传感器返回 `None`
    pub const fn toggle_kind(self) -> Option<ToggleKind> {
        match self {
            Channel::Door => Some(ToggleKind::Door),
            Channel::Light => Some(ToggleKind::Light),
            Channel::Lock => Some(ToggleKind::Lock),
            Channel::EyeSensor => None,
        }
    }

    /// 当前状态对应的图标（仅开关通道）
    pub const fn icon(self, state: bool) -> Option<&'static str> {
        match (self, state) {
            (Channel::Door, true) => Some("mdi:garage-open"),
            (Channel::Door, false) => Some("mdi:garage"),
            (Channel::Light, true) => Some("mdi:lightbulb-on"),
            (Channel::Light, false) => Some("mdi:lightbulb"),
            (Channel::Lock, true) => Some("mdi:lock"),
            (Channel::Lock, false) => Some("mdi:lock-open"),
            (Channel::EyeSensor, _) => None,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Channel::Door => 0,
            Channel::Light => 1,
            Channel::Lock => 2,
            Channel::EyeSensor => 3,
        }
    }
}

impl From<ToggleKind> for Channel {
    fn from(kind: ToggleKind) -> Self {
        match kind {
            ToggleKind::Door => Channel::Door,
            ToggleKind::Light => Channel::Light,
            ToggleKind::Lock => Channel::Lock,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

/// 已发布的状态快照
///
/// 通过 `ArcSwap` 无锁共享给 IO 线程以外的读取方。`None` 表示从未收到过该通道的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DoorState {
    pub door_open: Option<bool>,
    pub light_on: Option<bool>,
    pub door_locked: Option<bool>,
    pub eye_blocked: Option<bool>,
    /// 最近一次状态变化的时间（毫秒，0 表示从未变化）
    pub updated_ms: u64,
}

impl DoorState {
    pub fn get(&self, channel: Channel) -> Option<bool> {
        match channel {
            Channel::Door => self.door_open,
            Channel::Light => self.light_on,
            Channel::Lock => self.door_locked,
            Channel::EyeSensor => self.eye_blocked,
        }
    }

    pub(crate) fn set(&mut self, channel: Channel, value: bool) {
        let slot = match channel {
            Channel::Door => &mut self.door_open,
            Channel::Light => &mut self.light_on,
            Channel::Lock => &mut self.door_locked,
            Channel::EyeSensor => &mut self.eye_blocked,
        };
        *slot = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_display_padding() {
        assert_eq!(Channel::Door.to_string(), "door");
        assert_eq!(format!("{:<10}|", Channel::Door), "door      |");
        assert_eq!(format!("{:>6}", Channel::Lock), "  lock");
        assert_eq!(format!("{:<10}|", Channel::EyeSensor), "eye_sensor|");
    }

    #[test]
    fn test_channel_icons() {
        assert_eq!(Channel::Door.icon(true), Some("mdi:garage-open"));
        assert_eq!(Channel::Door.icon(false), Some("mdi:garage"));
        assert_eq!(Channel::Light.icon(true), Some("mdi:lightbulb-on"));
        assert_eq!(Channel::Lock.icon(true), Some("mdi:lock"));
        assert_eq!(Channel::Lock.icon(false), Some("mdi:lock-open"));
        assert_eq!(Channel::EyeSensor.icon(true), None);
    }

    #[test]
    fn test_channel_names() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_name(channel.name()), Some(channel));
        }
        assert_eq!(Channel::from_name("garage"), None);
        assert_eq!(Channel::EyeSensor.to_string(), "eye_sensor");
    }

    #[test]
    fn test_toggle_kind_mapping() {
        assert_eq!(Channel::Light.toggle_kind(), Some(ToggleKind::Light));
        assert_eq!(Channel::EyeSensor.toggle_kind(), None);
        assert_eq!(Channel::from(ToggleKind::Lock), Channel::Lock);
    }

    #[test]
    fn test_door_state_get_set() {
        let mut state = DoorState::default();
        assert_eq!(state.get(Channel::Door), None);
        state.set(Channel::Door, true);
        state.set(Channel::EyeSensor, false);
        assert_eq!(state.get(Channel::Door), Some(true));
        assert_eq!(state.get(Channel::EyeSensor), Some(false));
        assert_eq!(state.get(Channel::Lock), None);
    }
}
