use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind as ClapErrorKind;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::info;

use crate::capture::{Capture, MonitorScreen};
use crate::config::{Config, init};
use crate::shutdown::Shutdown;

#[derive(Parser, Debug)]
#[command(name = "goshot")]
#[command(about = "A lightweight screenshot tool", long_about = None)]
#[command(version, author)]
pub struct Cli {
    /// Load configuration from FILE
    #[arg(short, long, value_name = "FILE", env = "GOSHOT_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// 空字符串等同于未指定配置文件
    fn config_file(&self) -> Option<&Path> {
        self.config
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(Path::new)
    }
}

/// 参数错误的退出码：帮助和版本信息为 0，其余错误统一为 1
fn usage_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ClapErrorKind::DisplayHelp
        | ClapErrorKind::DisplayVersion
        | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => 1,
    }
}

/// CLI 入口函数
pub async fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = usage_exit_code(&e);
            if code == 0 {
                e.exit();
            }
            let _ = e.print();
            std::process::exit(code);
        }
    };
    init::init(cli.log_level.as_deref());

    let shutdown = Shutdown::install();
    let result = take_screenshots(&cli, &shutdown).await;
    shutdown.release().await;

    result
}

/// 加载配置、准备目录并截取所有显示器
async fn take_screenshots(cli: &Cli, shutdown: &Shutdown) -> Result<()> {
    let config = Config::load(cli.config_file())?;
    ensure_dir(Path::new(&config.path))?;

    let cancel = shutdown.token();
    tokio::task::spawn_blocking(move || {
        let screen = MonitorScreen::new()?;
        Capture::new(&screen, &config).run(&cancel, |path| {
            println!("Saved {}", path.display());
        })
    })
    .await
    .context("Capture task panicked")??;

    Ok(())
}

/// 目录不存在时创建（只创建一级），已存在则不做任何改动
fn ensure_dir(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("Creating output directory {}", path.display());
            fs::create_dir(path)
                .with_context(|| format!("Failed to create output directory {}", path.display()))
        }
        Err(e) => Err(e)
            .with_context(|| format!("Failed to read output directory {}", path.display())),
    }
}
