//! 状态去重发布
//!
//! 解释器每次扫描都会重新得出同样的状态，这里只放行真正变化的值。

use crate::interpreter::DecodedSnapshot;
use crate::state::Channel;
use tracing::debug;

/// 状态去重器
///
/// 每个通道记录上次发布的值。初始为未知，所以第一个出现的值总会发布。
#[derive(Debug, Clone, Default)]
pub struct StateReconciler {
    last: [Option<bool>; 4],
}

impl StateReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 对比快照，返回需要发布的 (通道, 新值)，并更新记录
    ///
    /// 快照中缺失的字段不会发布，也不会清除记录。
    pub fn reconcile(&mut self, snapshot: &DecodedSnapshot) -> Vec<(Channel, bool)> {
        let mut changes = Vec::new();
        for channel in Channel::ALL {
            let Some(value) = snapshot_value(snapshot, channel) else {
                continue;
            };
            let slot = &mut self.last[channel.index()];
            if *slot != Some(value) {
                debug!("{} changed: {:?} -> {}", channel, slot, value);
                *slot = Some(value);
                changes.push((channel, value));
            }
        }
        changes
    }

    /// 上次发布的值
    pub fn last(&self, channel: Channel) -> Option<bool> {
        self.last[channel.index()]
    }
}

fn snapshot_value(snapshot: &DecodedSnapshot, channel: Channel) -> Option<bool> {
    match channel {
        Channel::Door => snapshot.door_open,
        Channel::Light => snapshot.light_on,
        Channel::Lock => snapshot.door_locked,
        Channel::EyeSensor => snapshot.eye_blocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_value_publishes() {
        let mut reconciler = StateReconciler::new();
        let snapshot = DecodedSnapshot {
            door_open: Some(false),
            ..Default::default()
        };
        // false 也要发布：初始状态是未知而不是 false
        assert_eq!(reconciler.reconcile(&snapshot), vec![(Channel::Door, false)]);
        assert_eq!(reconciler.last(Channel::Door), Some(false));
    }

    #[test]
    fn test_unchanged_value_suppressed() {
        let mut reconciler = StateReconciler::new();
        let snapshot = DecodedSnapshot {
            light_on: Some(true),
            door_locked: Some(false),
            ..Default::default()
        };
        assert_eq!(reconciler.reconcile(&snapshot).len(), 2);
        assert!(reconciler.reconcile(&snapshot).is_empty());
    }

    #[test]
    fn test_absent_never_publishes() {
        let mut reconciler = StateReconciler::new();
        reconciler.reconcile(&DecodedSnapshot {
            eye_blocked: Some(true),
            ..Default::default()
        });

        assert!(reconciler.reconcile(&DecodedSnapshot::default()).is_empty());
        assert_eq!(reconciler.last(Channel::EyeSensor), Some(true));
    }

    #[test]
    fn test_change_publishes() {
        let mut reconciler = StateReconciler::new();
        reconciler.reconcile(&DecodedSnapshot {
            door_open: Some(true),
            ..Default::default()
        });
        let changes = reconciler.reconcile(&DecodedSnapshot {
            door_open: Some(false),
            eye_blocked: Some(false),
            ..Default::default()
        });
        assert_eq!(
            changes,
            vec![(Channel::Door, false), (Channel::EyeSensor, false)]
        );
    }
}
