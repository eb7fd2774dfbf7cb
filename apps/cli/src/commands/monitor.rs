//! 监听命令
//!
//! 打印解码出的状态变化，可选地把总线流量录制到文件

use crate::connection::ConnectionArgs;
use crate::display::{ChangePrinter, print_state};
use anyhow::{Context, Result};
use clap::Args;
use crossbeam_channel::Receiver;
use garage_driver::{TraceEntry, TraceRecordingHook, format_trace_entry};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 监听命令参数
#[derive(Args, Debug)]
pub struct MonitorCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// 录制总线流量到文件
    #[arg(short, long)]
    pub record: Option<PathBuf>,

    /// 监听时长（秒），0 表示直到 Ctrl+C
    #[arg(short, long, default_value_t = 0)]
    pub duration: u64,
}

impl MonitorCommand {
    pub fn execute(&self, config_path: &Path) -> Result<()> {
        let driver = self.connection.connect(config_path)?;
        driver.add_callback(Arc::new(ChangePrinter));

        // 录制线程：把 TraceEntry 逐行写入文件
        let recorder = match &self.record {
            Some(path) => {
                let (hook, rx) = TraceRecordingHook::new();
                let dropped = hook.dropped_counter().clone();
                driver.add_callback(Arc::new(hook));
                let writer = spawn_trace_writer(path, driver.port(), rx)?;
                println!("💾 录制到: {}", path.display());
                Some((writer, dropped))
            },
            None => None,
        };

        // 设置 Ctrl+C 处理
        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        })
        .context("设置 Ctrl+C 处理失败")?;

        println!("📊 监听中，按 Ctrl+C 停止\n");
        let start = Instant::now();
        while running.load(Ordering::SeqCst) {
            if !driver.is_running() {
                warn!("IO thread stopped, exiting monitor");
                break;
            }
            if self.duration > 0 && start.elapsed() >= Duration::from_secs(self.duration) {
                println!("\n⏱️  达到时长限制");
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        let (rx_bytes, tx_bytes) = driver.byte_counts();
        println!("\n最终状态:");
        print_state(&driver.state());
        println!("收到 {} 字节，发出 {} 字节", rx_bytes, tx_bytes);

        // 驱动释放后录制通道关闭，写线程随之结束
        drop(driver);
        if let Some((writer, dropped)) = recorder {
            let written = writer
                .join()
                .map_err(|_| anyhow::anyhow!("录制线程 panic"))??;
            println!("✅ 录制完成: {} 条", written);
            let dropped = dropped.load(Ordering::Relaxed);
            if dropped > 0 {
                warn!("{} trace entries dropped (channel full)", dropped);
            }
        }

        println!("✅ 监听已结束");
        Ok(())
    }
}

/// 启动录制写线程，返回写入的条目数
fn spawn_trace_writer(
    path: &Path,
    port: &str,
    rx: Receiver<TraceEntry>,
) -> Result<JoinHandle<Result<u64>>> {
    let file =
        File::create(path).with_context(|| format!("创建录制文件失败: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "# garage-bus trace")?;
    writeln!(out, "# port: {}", port)?;

    let handle = std::thread::Builder::new()
        .name("garage-trace".into())
        .spawn(move || -> Result<u64> {
            let mut count = 0u64;
            for entry in rx {
                writeln!(out, "{}", format_trace_entry(&entry))?;
                count += 1;
            }
            out.flush()?;
            info!("Trace writer finished: {} entries", count);
            Ok(count)
        })
        .context("创建录制线程失败")?;
    Ok(handle)
}
