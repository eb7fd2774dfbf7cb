//! 集成测试公共工具

#![allow(dead_code)]

use crossbeam_channel::{Receiver, Sender, unbounded};
use garage_driver::{BusCallback, Channel, GarageDoor, ManualClock};
use garage_serial::{MockBusHandle, MockSerialAdapter};
use std::sync::Arc;

/// 把状态变化转发到 Channel 的回调
pub struct PublishCollector {
    tx: Sender<(Channel, bool)>,
}

impl PublishCollector {
    pub fn new() -> (Arc<Self>, Receiver<(Channel, bool)>) {
        let (tx, rx) = unbounded();
        (Arc::new(Self { tx }), rx)
    }
}

impl BusCallback for PublishCollector {
    fn on_state_changed(&self, channel: Channel, value: bool) {
        let _ = self.tx.send((channel, value));
    }
}

/// 单线程测试台：Mock 总线 + 手动时钟
pub struct Bench {
    pub garage: GarageDoor<MockSerialAdapter, ManualClock>,
    pub bus: MockBusHandle,
    pub clock: ManualClock,
    pub published: Receiver<(Channel, bool)>,
}

impl Bench {
    /// 时钟从 1ms 开始，测试用 `feed` 按需推进（手动时钟不能倒退）
    pub fn new() -> Self {
        let (adapter, bus) = MockSerialAdapter::new();
        let clock = ManualClock::new(1);
        let garage = GarageDoor::new(adapter, clock.clone());
        let (collector, published) = PublishCollector::new();
        garage.add_callback(collector);
        Self {
            garage,
            bus,
            clock,
            published,
        }
    }

    /// 在指定时间注入一个字节并运行一轮
    pub fn feed(&mut self, byte: u8, at_ms: u64) {
        self.clock.set(at_ms);
        self.bus.inject(&[byte]);
        self.garage.loop_once().unwrap();
    }

    /// 依次注入 (字节, 时间)
    pub fn feed_all(&mut self, bytes: &[(u8, u64)]) {
        for &(byte, at_ms) in bytes {
            self.feed(byte, at_ms);
        }
    }

    /// 在指定时间运行一轮，返回写出的字节
    pub fn run_at(&mut self, at_ms: u64) -> Vec<u8> {
        self.clock.set(at_ms);
        self.garage.loop_once().unwrap();
        self.bus.take_written()
    }

    /// 取出目前为止所有的发布
    pub fn drain_published(&self) -> Vec<(Channel, bool)> {
        self.published.try_iter().collect()
    }
}
