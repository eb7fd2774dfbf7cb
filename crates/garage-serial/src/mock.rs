//! Mock 串口适配器
//!
//! 用于测试和离线回放的模拟总线：测试代码通过 [`MockBusHandle`] 注入总线字节、
//! 检查本端写出的字节。

use crate::{SerialAdapter, SerialError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// 模拟总线状态
#[derive(Debug, Default)]
struct MockBus {
    /// 待读取的字节（总线 -> 本端）
    rx: VecDeque<u8>,
    /// 本端写出的字节（按写出顺序）
    tx: Vec<u8>,
    /// 是否将写出的字节回环到接收队列（模拟共享总线）
    loopback: bool,
    /// 是否模拟写失败
    fail_writes: bool,
    /// 是否模拟设备断开
    disconnected: bool,
}

/// 模拟总线的控制句柄（可克隆，跨线程共享）
#[derive(Debug, Clone, Default)]
pub struct MockBusHandle {
    bus: Arc<Mutex<MockBus>>,
}

impl MockBusHandle {
    fn lock(&self) -> MutexGuard<'_, MockBus> {
        // 测试线程 panic 后继续使用内部数据
        self.bus.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 注入总线字节
    pub fn inject(&self, bytes: &[u8]) {
        self.lock().rx.extend(bytes.iter().copied());
    }

    /// 取出本端已写出的所有字节
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.lock().tx)
    }

    /// 本端已写出的字节（不清空）
    pub fn written(&self) -> Vec<u8> {
        self.lock().tx.clone()
    }

    /// 尚未被读取的字节数
    pub fn pending_rx(&self) -> usize {
        self.lock().rx.len()
    }

    pub fn set_loopback(&self, loopback: bool) {
        self.lock().loopback = loopback;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn disconnect(&self) {
        self.lock().disconnected = true;
    }
}

/// Mock 串口适配器
#[derive(Debug, Clone, Default)]
pub struct MockSerialAdapter {
    handle: MockBusHandle,
}

impl MockSerialAdapter {
    /// 创建适配器及其控制句柄
    pub fn new() -> (Self, MockBusHandle) {
        let handle = MockBusHandle::default();
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }

    /// 创建回环适配器（写出的字节会被自己读到）
    pub fn with_loopback() -> (Self, MockBusHandle) {
        let (adapter, handle) = Self::new();
        handle.set_loopback(true);
        (adapter, handle)
    }

    pub fn handle(&self) -> MockBusHandle {
        self.handle.clone()
    }
}

impl SerialAdapter for MockSerialAdapter {
    fn read_byte(&mut self) -> Result<Option<u8>, SerialError> {
        let mut bus = self.handle.lock();
        if bus.disconnected {
            return Err(SerialError::Disconnected);
        }
        Ok(bus.rx.pop_front())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        let mut bus = self.handle.lock();
        if bus.disconnected {
            return Err(SerialError::Disconnected);
        }
        if bus.fail_writes {
            return Err(SerialError::Io(std::io::Error::other("mock write failure")));
        }
        bus.tx.push(byte);
        if bus.loopback {
            bus.rx.push_back(byte);
        }
        Ok(())
    }
}
