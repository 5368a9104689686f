use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, is_separator};
use tracing::info;

/// 默认输出目录
pub const DEFAULT_PATH: &str = ".";

/// 单次运行的配置，加载后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// 截图输出目录，不以路径分隔符结尾
    pub path: String,
}

/// 配置文件中 `goshot` 命名空间下可覆盖的字段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Overrides {
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    goshot: Option<Overrides>,
}

impl Config {
    /// 加载配置：未指定文件时只使用默认值
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let overrides = match config_file {
            Some(path) => {
                info!("Loading config from {}", path.display());
                Self::read_overrides(path)?
            }
            None => {
                info!("No config file given, using defaults");
                Overrides::default()
            }
        };

        let config = Self::merge(Self::default(), overrides)?;
        info!("Output path: {}", config.path);
        Ok(config)
    }

    /// 用文件中的值覆盖默认值，并统一做路径规范化
    pub fn merge(defaults: Config, overrides: Overrides) -> Result<Self> {
        let path = overrides.path.unwrap_or(defaults.path);
        let trimmed = path.trim_end_matches(is_separator);
        if trimmed.is_empty() {
            anyhow::bail!("Invalid output path {:?}: must name a directory", path);
        }

        Ok(Self {
            path: trimmed.to_string(),
        })
    }

    fn read_overrides(path: &Path) -> Result<Overrides> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Overrides::default());
        }

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let file: ConfigFile = if is_toml {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        };

        Ok(file.goshot.unwrap_or_default())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: DEFAULT_PATH.to_string(),
        }
    }
}
