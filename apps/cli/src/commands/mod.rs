//! 命令定义和实现

pub mod config;
pub mod decode;
pub mod monitor;
pub mod ports;
pub mod switch;
pub mod toggle;

pub use config::ConfigCommand;
pub use decode::DecodeCommand;
pub use monitor::MonitorCommand;
pub use ports::PortsCommand;
pub use switch::SwitchCommand;
pub use toggle::ToggleCommand;
