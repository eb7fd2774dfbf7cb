//! 驱动层错误类型定义

use garage_serial::SerialError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 串口错误
    #[error("Serial error: {0}")]
    Serial(#[from] SerialError),

    /// 切换请求被拒绝：已有一个序列正在发送，且排队槽位已被占用
    #[error("Toggle busy: one sequence in flight and one already queued")]
    ToggleBusy,

    /// 请求通道已关闭（IO 线程退出）
    #[error("Toggle channel closed")]
    ChannelClosed,

    /// 请求通道已满（缓冲区容量 4）
    #[error("Toggle channel full (buffer size: 4)")]
    ChannelFull,

    /// IO 线程错误
    #[error("IO thread error: {0}")]
    IoThread(String),

    /// 操作超时
    #[error("Operation timeout")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::DriverError;
    use garage_serial::SerialError;

    #[test]
    fn test_driver_error_display() {
        let driver_error = DriverError::Serial(SerialError::Disconnected);
        let msg = format!("{}", driver_error);
        assert_eq!(msg, "Serial error: Serial port disconnected");

        let msg = format!("{}", DriverError::ToggleBusy);
        assert!(msg.contains("Toggle busy"));

        assert_eq!(
            format!("{}", DriverError::ChannelClosed),
            "Toggle channel closed"
        );
        assert!(format!("{}", DriverError::ChannelFull).contains("channel full"));

        let msg = format!("{}", DriverError::IoThread("spawn failed".to_string()));
        assert!(msg.contains("IO thread") && msg.contains("spawn failed"));

        assert_eq!(format!("{}", DriverError::Timeout), "Operation timeout");
    }

    #[test]
    fn test_from_serial_error() {
        let driver_error: DriverError = SerialError::Disconnected.into();
        match driver_error {
            DriverError::Serial(e) => assert!(matches!(e, SerialError::Disconnected)),
            _ => panic!("Expected Serial variant"),
        }
    }
}
