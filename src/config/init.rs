use tracing_subscriber::{EnvFilter, fmt};

/// 默认日志等级
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// 初始化日志系统
///
/// 日志写到 stderr，stdout 只留给保存结果和错误信息
pub fn init(level: Option<&str>) {
    // 环境变量优先，其次命令行参数
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(DEFAULT_LOG_LEVEL)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}
