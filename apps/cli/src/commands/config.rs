//! 配置管理命令
//!
//! 用于管理 CLI 配置（默认串口、波特率）

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;

    path.push("garage-bus");
    path.push("config.toml");
    Ok(path)
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// 默认串口设备
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,

    /// 默认波特率
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baud_rate: Option<u32>,
}

impl CliConfig {
    /// 加载配置，文件不存在时返回默认配置
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    /// 保存配置
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("创建配置目录失败")?;
        }

        let body = toml::to_string_pretty(self).context("序列化配置失败")?;
        let content = format!("# Garage CLI Configuration\n\n{}", body);
        fs::write(path, content).context("写入配置文件失败")?;

        Ok(())
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 设置配置项
    Set {
        /// 串口设备（如 /dev/ttyUSB0, COM3）
        #[arg(short, long)]
        port: Option<String>,

        /// 波特率
        #[arg(short, long)]
        baud_rate: Option<u32>,
    },

    /// 获取配置项
    Get {
        /// 配置项名称（port, baud_rate, all）
        #[arg(default_value = "all")]
        key: String,
    },

    /// 删除配置文件
    Reset,

    /// 检查配置
    Check,
}

impl ConfigCommand {
    pub fn execute(self, path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Set { port, baud_rate } => Self::set_(path, port, baud_rate),

            ConfigCommand::Get { key } => Self::get_(path, &key),

            ConfigCommand::Reset => Self::reset_(path),

            ConfigCommand::Check => Self::check_(path),
        }
    }

    fn set_(path: &Path, port: Option<String>, baud_rate: Option<u32>) -> Result<()> {
        let mut config = CliConfig::load(path)?;

        if let Some(ref port) = port {
            config.port = Some(port.clone());
            println!("✅ 设置默认串口: {}", port);
        }

        if let Some(baud) = baud_rate {
            anyhow::ensure!(baud > 0, "波特率必须为正数");
            config.baud_rate = Some(baud);
            println!("✅ 设置波特率: {}", baud);
        }

        config.save(path)?;
        Ok(())
    }

    fn get_(path: &Path, key: &str) -> Result<()> {
        let config = CliConfig::load(path)?;

        match key {
            "port" => match config.port {
                Some(ref port) => println!("{}", port),
                None => println!("(未设置)"),
            },

            "baud_rate" => match config.baud_rate {
                Some(baud) => println!("{}", baud),
                None => println!("(未设置)"),
            },

            "all" => {
                println!("Garage CLI 配置:");
                println!("  串口: {:?}", config.port);
                println!("  波特率: {:?}", config.baud_rate);
            },

            other => anyhow::bail!("未知配置项: {}", other),
        }

        Ok(())
    }

    fn reset_(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path).context("删除配置文件失败")?;
            println!("✅ 已删除配置文件: {}", path.display());
        } else {
            println!("配置文件不存在: {}", path.display());
        }
        Ok(())
    }

    fn check_(path: &Path) -> Result<()> {
        let config = CliConfig::load(path)?;

        println!("配置文件: {}", path.display());
        println!("  串口: {:?}", config.port);
        println!("  波特率: {:?}", config.baud_rate);

        Ok(())
    }
}
