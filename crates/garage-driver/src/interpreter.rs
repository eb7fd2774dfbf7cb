//! 帧解释器
//!
//! 每当有新字节到达，就从头重新扫描整个窗口（最近 5 个字节），
//! 从中找出查询/应答对和切换序列。扫描是纯函数：同一个窗口扫描两次，结果完全相同。
//!
//! # 扫描规则
//!
//! 对窗口位置 `i = 0..5`：
//!
//! 1. 空槽位跳过
//! 2. 查询请求字节：与 `i + 1` 组成查询帧；间隔超过 100ms 的帧被丢弃，
//!    否则按应答表解码。应答槽位被消费，扫描从 `i + 2` 继续
//! 3. 切换序列首字节（只在 `i == 0` 处理）：交给 [`confirm_toggle`]，仅用于诊断
//! 4. 窗口最后一个字节既不是请求也不是切换首字节：记为游离字节

use crate::confirm::{ToggleMatch, confirm_toggle};
use crate::history::{RingEntry, Window};
use garage_protocol::{
    ByteKind, Command, DoorStatus, EyeSensorStatus, HISTORY_LEN, LightStatus, LockStatus,
    MAX_RESPONSE_DELAY_MS, ToggleKind,
};
use tracing::{debug, info, warn};

/// 一次扫描得到的状态
///
/// 每个字段独立可选：`None` 表示本次扫描没有新证据，而不是"关闭"。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodedSnapshot {
    pub door_open: Option<bool>,
    pub light_on: Option<bool>,
    pub door_locked: Option<bool>,
    pub eye_blocked: Option<bool>,
}

impl DecodedSnapshot {
    /// 是否没有任何字段
    pub fn is_empty(&self) -> bool {
        self.door_open.is_none()
            && self.light_on.is_none()
            && self.door_locked.is_none()
            && self.eye_blocked.is_none()
    }
}

/// 扫描报告
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanReport {
    /// 解码出的状态
    pub snapshot: DecodedSnapshot,
    /// 窗口起点处的切换序列及其确认结果
    pub toggle: Option<(ToggleKind, ToggleMatch)>,
    /// 因应答过慢而丢弃的查询帧数量
    pub discarded_frames: u8,
    /// 游离字节（窗口末尾无法归类的字节）
    pub stray: Option<RingEntry>,
}

/// 扫描窗口（从旧到新）
pub fn interpret(window: &Window) -> ScanReport {
    let mut report = ScanReport::default();
    let mut has_toggle = false;

    let mut i = 0;
    while i < HISTORY_LEN {
        let input = window[i];
        if input.is_empty() {
            i += 1;
            continue;
        }

        let kind = ByteKind::classify(input.byte);
        has_toggle |= matches!(kind, ByteKind::ToggleStart(_));

        match kind {
            ByteKind::Command(command) if i + 1 < HISTORY_LEN => {
                // 应答槽位无论是否有效都被消费
                i += 1;
                let response = window[i];
                if response.is_empty() {
                    debug!("Incomplete frame for {:?}, response slot empty", command);
                } else {
                    let delay = response.timestamp_ms.saturating_sub(input.timestamp_ms);
                    if delay > MAX_RESPONSE_DELAY_MS {
                        info!(
                            "Time between request/response exceeds {} milliseconds: {}",
                            MAX_RESPONSE_DELAY_MS, delay
                        );
                        report.discarded_frames += 1;
                    } else {
                        decode_response(command, response.byte, &mut report.snapshot);
                    }
                }
            },
            ByteKind::ToggleStart(toggle) if i == 0 => {
                let result = confirm_toggle(window, &toggle.sequence());
                if result.is_confirmed() {
                    info!("{} toggled", capitalize(toggle.name()));
                }
                report.toggle = Some((toggle, result));
            },
            ByteKind::Command(_) => {},
            _ if i + 1 == HISTORY_LEN && !has_toggle => {
                info!(
                    "Unexpected input data: Millis({}ms) Data(0x{:02x})",
                    input.timestamp_ms, input.byte
                );
                report.stray = Some(input);
            },
            _ => {},
        }
        i += 1;
    }

    debug!(
        "Scan: {:?} (discarded {}, toggle {:?})",
        report.snapshot, report.discarded_frames, report.toggle
    );
    report
}

/// 按请求类型解码应答字节，未知值只记日志
fn decode_response(command: Command, byte: u8, snapshot: &mut DecodedSnapshot) {
    match command {
        Command::LightAndLockState => {
            match LightStatus::decode(byte) {
                Ok(light) => snapshot.light_on = Some(light.is_on()),
                Err(e) => info!("{}", e),
            }
            match LockStatus::decode(byte) {
                Ok(lock) => snapshot.door_locked = Some(lock.is_locked()),
                Err(e) => info!("{}", e),
            }
        },
        Command::DoorState => match DoorStatus::decode(byte) {
            Ok(door) => {
                if door != DoorStatus::Open && door != DoorStatus::Closed {
                    info!("Door {:?}", door);
                }
                snapshot.door_open = Some(door.is_open());
            },
            Err(_) => warn!("Unexpected Door state: 0x{:02x}", byte),
        },
        Command::EyeSensorState => match EyeSensorStatus::decode(byte) {
            Ok(eye) => snapshot.eye_blocked = Some(eye.is_blocked()),
            Err(_) => warn!("Unexpected EyeSensor state: 0x{:02x}", byte),
        },
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(entries: [(u8, u64); HISTORY_LEN]) -> Window {
        entries.map(|(byte, ts)| RingEntry::new(byte, ts))
    }

    /// 前面补空槽位，把字节放在窗口末尾（与真实写入顺序一致）
    fn tail_window(entries: &[(u8, u64)]) -> Window {
        let mut w = [RingEntry::EMPTY; HISTORY_LEN];
        let offset = HISTORY_LEN - entries.len();
        for (k, &(byte, ts)) in entries.iter().enumerate() {
            w[offset + k] = RingEntry::new(byte, ts);
        }
        w
    }

    #[test]
    fn test_empty_window() {
        let report = interpret(&[RingEntry::EMPTY; HISTORY_LEN]);
        assert!(report.snapshot.is_empty());
        assert_eq!(report.discarded_frames, 0);
        assert!(report.toggle.is_none());
        assert!(report.stray.is_none());
    }

    #[test]
    fn test_door_frame() {
        let report = interpret(&tail_window(&[(0x38, 1000), (0x52, 1010)]));
        assert_eq!(report.snapshot.door_open, Some(true));
        assert_eq!(report.snapshot.light_on, None);
    }

    #[test]
    fn test_door_collapse() {
        for (byte, open) in [
            (0x01, true),
            (0x04, false),
            (0x06, true),
            (0x55, false),
            (0x52, true),
        ] {
            let report = interpret(&tail_window(&[(0x38, 1000), (byte, 1010)]));
            assert_eq!(report.snapshot.door_open, Some(open), "byte 0x{:02x}", byte);
        }
    }

    #[test]
    fn test_light_and_lock_frame() {
        let report = interpret(&tail_window(&[(0x3a, 1000), (0x59, 1010)]));
        assert_eq!(report.snapshot.light_on, Some(false));
        assert_eq!(report.snapshot.door_locked, Some(false));

        let report = interpret(&tail_window(&[(0x3a, 1000), (0x55, 1010)]));
        assert_eq!(report.snapshot.light_on, Some(true));
        assert_eq!(report.snapshot.door_locked, Some(true));
    }

    #[test]
    fn test_eye_sensor_frame() {
        let report = interpret(&tail_window(&[(0x39, 1000), (0x04, 1020)]));
        assert_eq!(report.snapshot.eye_blocked, Some(true));
    }

    #[test]
    fn test_slow_response_discarded() {
        let report = interpret(&tail_window(&[(0x39, 1000), (0x04, 1150)]));
        assert_eq!(report.snapshot.eye_blocked, None);
        assert_eq!(report.discarded_frames, 1);
    }

    #[test]
    fn test_response_at_threshold_accepted() {
        let report = interpret(&tail_window(&[(0x39, 1000), (0x00, 1100)]));
        assert_eq!(report.snapshot.eye_blocked, Some(false));
        assert_eq!(report.discarded_frames, 0);
    }

    #[test]
    fn test_unknown_values_leave_field_absent() {
        let report = interpret(&tail_window(&[(0x38, 1000), (0x5b, 1010)]));
        assert_eq!(report.snapshot.door_open, None);

        let report = interpret(&tail_window(&[(0x39, 1000), (0x02, 1010)]));
        assert_eq!(report.snapshot.eye_blocked, None);

        let report = interpret(&tail_window(&[(0x3a, 1000), (0x53, 1010)]));
        assert!(report.snapshot.is_empty());
    }

    #[test]
    fn test_two_frames_in_window() {
        let report = interpret(&tail_window(&[
            (0x38, 1000),
            (0x55, 1010),
            (0x3a, 1100),
            (0x5d, 1110),
        ]));
        assert_eq!(report.snapshot.door_open, Some(false));
        assert_eq!(report.snapshot.light_on, Some(true));
        assert_eq!(report.snapshot.door_locked, Some(false));
        assert!(report.stray.is_none());
    }

    #[test]
    fn test_response_slot_not_reclassified() {
        // 应答 0x38 被当作应答消费，不会被当成新的请求
        let report = interpret(&window([
            (0x39, 1000),
            (0x00, 1010),
            (0x38, 1020),
            (0x38, 1030),
            (0x52, 1040),
        ]));
        assert_eq!(report.snapshot.eye_blocked, Some(false));
        // [2]=0x38 请求，[3]=0x38 作为它的应答（未知门状态）
        assert_eq!(report.snapshot.door_open, None);
        // [4]=0x52 是窗口末尾的游离字节
        assert_eq!(report.stray, Some(RingEntry::new(0x52, 1040)));
    }

    #[test]
    fn test_trailing_command_without_response() {
        // 最后一个槽位是请求字节，既不解码也不算游离
        let report = interpret(&tail_window(&[(0x38, 1000), (0x52, 1010), (0x3a, 1100)]));
        assert_eq!(report.snapshot.door_open, Some(true));
        assert!(report.stray.is_none());
    }

    #[test]
    fn test_toggle_only_at_window_start() {
        let report = interpret(&window([
            (0x32, 1000),
            (0x33, 1005),
            (0x33, 1009),
            (0x38, 1050),
            (0x52, 1060),
        ]));
        assert!(matches!(
            report.toggle,
            Some((ToggleKind::Light, ToggleMatch::Adjacent { .. }))
        ));
        assert_eq!(report.snapshot.door_open, Some(true));

        // 切换首字节不在位置 0：不做确认
        let report = interpret(&tail_window(&[(0x30, 1000), (0x31, 1220), (0x31, 1240)]));
        assert!(report.toggle.is_none());
        // 首字节已出现过，末尾字节不算游离
        assert!(report.stray.is_none());
    }

    #[test]
    fn test_stray_byte() {
        let report = interpret(&tail_window(&[(0x38, 1000), (0x52, 1010), (0x77, 1500)]));
        assert_eq!(report.snapshot.door_open, Some(true));
        assert_eq!(report.stray, Some(RingEntry::new(0x77, 1500)));
    }

    #[test]
    fn test_scan_is_idempotent() {
        let w = window([
            (0x3a, 1000),
            (0x59, 1010),
            (0x38, 1100),
            (0x04, 1110),
            (0x39, 1200),
        ]);
        assert_eq!(interpret(&w), interpret(&w));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("door"), "Door");
        assert_eq!(capitalize(""), "");
    }
}
