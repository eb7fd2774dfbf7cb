//! 终端输出格式

use garage_driver::{BusCallback, Channel, DoorState};

/// 通道状态的可读描述
pub fn describe(channel: Channel, value: bool) -> &'static str {
    match (channel, value) {
        (Channel::Door, true) => "open",
        (Channel::Door, false) => "closed",
        (Channel::Light, true) => "on",
        (Channel::Light, false) => "off",
        (Channel::Lock, true) => "locked",
        (Channel::Lock, false) => "unlocked",
        (Channel::EyeSensor, true) => "blocked",
        (Channel::EyeSensor, false) => "clear",
    }
}

/// 单行状态变化
pub fn format_change(channel: Channel, value: bool) -> String {
    match channel.icon(value) {
        Some(icon) => format!("{:<10} {:<8} ({})", channel, describe(channel, value), icon),
        None => format!("{:<10} {}", channel, describe(channel, value)),
    }
}

/// 完整状态表
pub fn print_state(state: &DoorState) {
    println!("========================================");
    for channel in Channel::ALL {
        match state.get(channel) {
            Some(value) => println!("  {}", format_change(channel, value)),
            None => println!("  {:<10} (unknown)", channel),
        }
    }
    println!("========================================");
}

/// 把状态变化打印到终端的回调
pub struct ChangePrinter;

impl BusCallback for ChangePrinter {
    fn on_state_changed(&self, channel: Channel, value: bool) {
        println!("📢 {}", format_change(channel, value));
    }
}
