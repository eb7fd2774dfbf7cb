//! # Garage CLI
//!
//! Command-line interface for the garage opener wall-button bus.
//!
//! ```bash
//! # 配置默认串口
//! garage-cli config set --port /dev/ttyUSB0
//!
//! # 监听总线并录制
//! garage-cli monitor --record bus.trace
//!
//! # 模拟按键
//! garage-cli toggle light
//!
//! # 离线解码录制文件
//! garage-cli decode bus.trace
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod connection;
mod display;

use commands::{
    ConfigCommand, DecodeCommand, MonitorCommand, PortsCommand, SwitchCommand, ToggleCommand,
};

/// Garage CLI - 车库门总线命令行工具
#[derive(Parser, Debug)]
#[command(name = "garage-cli")]
#[command(about = "Command-line interface for the garage opener wall-button bus", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 <config_dir>/garage-bus/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 监听总线，打印状态变化
    Monitor {
        #[command(flatten)]
        args: MonitorCommand,
    },

    /// 发送一次切换序列（模拟按键）
    Toggle {
        #[command(flatten)]
        args: ToggleCommand,
    },

    /// 写开关（总是发出一次切换）
    Switch {
        #[command(flatten)]
        args: SwitchCommand,
    },

    /// 离线解码录制文件
    Decode {
        #[command(flatten)]
        args: DecodeCommand,
    },

    /// 列出可用串口
    Ports {
        #[command(flatten)]
        args: PortsCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("garage_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Commands::Config(cmd) => cmd.execute(&config_path(config)?),
        Commands::Monitor { args } => args.execute(&config_path(config)?),
        Commands::Toggle { args } => args.execute(&config_path(config)?),
        Commands::Switch { args } => args.execute(&config_path(config)?),
        // 离线命令不读取配置
        Commands::Decode { args } => args.execute(),
        Commands::Ports { args } => args.execute(),
    }
}

fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => commands::config::default_config_file(),
    }
}
