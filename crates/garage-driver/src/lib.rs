//! # Garage Driver
//!
//! 车库门墙面按钮总线的解码与驱动层，包括：
//! - 输入历史（环形缓冲区）
//! - 帧解释器与切换序列确认
//! - 切换序列发送（冲突回避、单槽排队）
//! - 状态去重发布
//! - IO 线程管理（ArcSwap 无锁读取状态）
//! - 钩子系统：状态回调、总线录制
//!
//! # 使用示例
//!
//! ```no_run
//! use garage_driver::GarageDoorBuilder;
//! use garage_protocol::ToggleKind;
//!
//! let driver = GarageDoorBuilder::new().port("/dev/ttyUSB0").build().unwrap();
//! driver.toggle(ToggleKind::Light).unwrap();
//! println!("{:?}", driver.state());
//! ```

mod builder;
pub mod clock;
pub mod confirm;
mod driver;
mod error;
pub mod garage;
pub mod history;
pub mod hooks;
pub mod interpreter;
pub mod pipeline;
pub mod reconciler;
pub mod recording;
pub mod scan_rate;
pub mod sequencer;
pub mod state;

pub use builder::GarageDoorBuilder;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use confirm::{ToggleMatch, confirm_toggle};
pub use driver::GarageDoorDriver;
pub use error::DriverError;
pub use garage::{GarageDoor, LoopReport};
pub use history::{InputHistory, RingEntry, Window};
pub use hooks::{BusCallback, HookManager};
pub use interpreter::{DecodedSnapshot, ScanReport, interpret};
pub use pipeline::{DriverContext, PipelineConfig, ToggleRequest, io_loop};
pub use reconciler::StateReconciler;
pub use recording::{
    Direction, TraceEntry, TraceParseError, TraceRecordingHook, format_trace_entry, parse_trace,
};
pub use scan_rate::{AtomicScanRate, ScanRate};
pub use sequencer::{ToggleOutcome, ToggleSequencer, collision_offset};
pub use state::{Channel, DoorState};
