use image::RgbaImage;
use std::fmt;
use tracing::debug;
use xcap::Monitor;

use crate::capture::CaptureError;

/// 显示器的像素矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// 可枚举、可截图的显示器集合
///
/// `index` 从 0 开始，错误信息里的显示器编号从 1 开始
pub trait Screen {
    fn count(&self) -> usize;

    fn bounds(&self, index: usize) -> Result<Bounds, CaptureError>;

    fn capture(&self, index: usize, bounds: Bounds) -> Result<RgbaImage, CaptureError>;
}

/// 基于 xcap 的显示器实现
pub struct MonitorScreen {
    monitors: Vec<Monitor>,
}

impl MonitorScreen {
    pub fn new() -> Result<Self, CaptureError> {
        let monitors = Monitor::all().map_err(|e| CaptureError::Enumerate(e.to_string()))?;
        debug!("Found {} active displays", monitors.len());
        Ok(Self { monitors })
    }

    fn monitor(&self, index: usize) -> Result<&Monitor, CaptureError> {
        self.monitors.get(index).ok_or_else(|| CaptureError::Bounds {
            display: index + 1,
            reason: "display is gone".to_string(),
        })
    }
}

impl Screen for MonitorScreen {
    fn count(&self) -> usize {
        self.monitors.len()
    }

    fn bounds(&self, index: usize) -> Result<Bounds, CaptureError> {
        let monitor = self.monitor(index)?;
        let bounds_error = |e: xcap::XCapError| CaptureError::Bounds {
            display: index + 1,
            reason: e.to_string(),
        };

        Ok(Bounds {
            x: monitor.x().map_err(bounds_error)?,
            y: monitor.y().map_err(bounds_error)?,
            width: monitor.width().map_err(bounds_error)?,
            height: monitor.height().map_err(bounds_error)?,
        })
    }

    fn capture(&self, index: usize, bounds: Bounds) -> Result<RgbaImage, CaptureError> {
        debug!("Capturing display {} at {}", index + 1, bounds);
        self.monitor(index)?
            .capture_image()
            .map_err(|e| CaptureError::Capture {
                display: index + 1,
                reason: e.to_string(),
            })
    }
}
