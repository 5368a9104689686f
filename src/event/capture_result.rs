use image::RgbaImage;
use image::codecs::png::PngEncoder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::capture::CaptureError;

/// 单个显示器的截图结果，写盘后即丢弃
pub struct CaptureResult {
    /// 显示器编号，从 1 开始
    pub display: usize,
    pub path: PathBuf,
    pub image: RgbaImage,
}

impl CaptureResult {
    pub fn new(output_dir: &str, timestamp: &str, display: usize, image: RgbaImage) -> Self {
        Self {
            display,
            path: file_path(output_dir, timestamp, display),
            image,
        }
    }

    /// 创建（或截断）目标文件并以 PNG 写入
    pub fn save(&self) -> Result<&Path, CaptureError> {
        let file = File::create(&self.path).map_err(|source| CaptureError::Create {
            path: self.path.clone(),
            source,
        })?;

        let mut writer = BufWriter::new(file);
        self.image
            .write_with_encoder(PngEncoder::new(&mut writer))
            .map_err(|source| self.encode_error(source))?;
        writer
            .flush()
            .map_err(|e| self.encode_error(image::ImageError::IoError(e)))?;

        debug!("Display {} written to {}", self.display, self.path.display());
        Ok(&self.path)
    }

    fn encode_error(&self, source: image::ImageError) -> CaptureError {
        CaptureError::Encode {
            path: self.path.clone(),
            source,
        }
    }
}

/// `{dir}/{timestamp}_{display}.png`
pub fn file_path(output_dir: &str, timestamp: &str, display: usize) -> PathBuf {
    PathBuf::from(format!("{output_dir}/{timestamp}_{display}.png"))
}
