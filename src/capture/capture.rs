use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capture::{CaptureError, Screen};
use crate::config::Config;
use crate::event::CaptureResult;

/// 截图流程：依次截取每个显示器并保存为 PNG
///
/// 显示器严格按编号顺序处理，每个显示器开始前检查一次取消信号。
/// 任何错误都会终止后续显示器，已经写入的文件保留。
pub struct Capture<'a, S: Screen> {
    screen: &'a S,
    config: &'a Config,
}

impl<'a, S: Screen> Capture<'a, S> {
    pub fn new(screen: &'a S, config: &'a Config) -> Self {
        Self { screen, config }
    }

    /// 执行一次完整截图，返回保存的文件数量
    ///
    /// `on_saved` 在每个文件写入完成后调用
    pub fn run<F>(&self, cancel: &CancellationToken, on_saved: F) -> Result<usize, CaptureError>
    where
        F: FnMut(&Path),
    {
        self.run_at(&format_timestamp(Utc::now()), cancel, on_saved)
    }

    /// 使用给定时间戳执行截图，所有文件共用同一个时间戳
    pub fn run_at<F>(
        &self,
        timestamp: &str,
        cancel: &CancellationToken,
        mut on_saved: F,
    ) -> Result<usize, CaptureError>
    where
        F: FnMut(&Path),
    {
        let count = self.screen.count();
        info!("Capturing {} displays into {}", count, self.config.path);

        for index in 0..count {
            if cancel.is_cancelled() {
                warn!("Cancelled before display {}", index + 1);
                return Err(CaptureError::Cancelled);
            }

            let bounds = self.screen.bounds(index)?;
            debug!("Display {} bounds: {}", index + 1, bounds);

            let image = self.screen.capture(index, bounds)?;
            let result = CaptureResult::new(&self.config.path, timestamp, index + 1, image);
            on_saved(result.save()?);
        }

        Ok(count)
    }
}

/// UTC 时间的 RFC 3339 格式，去掉冒号以兼容不允许冒号的文件系统
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true).replace(':', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Bounds;
    use chrono::TimeZone;
    use image::{Rgba, RgbaImage};
    use std::cell::Cell;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const TS: &str = "2024-05-01T123456Z";

    /// 合成显示器，可在指定编号上失败或触发取消
    struct FakeScreen {
        displays: Vec<Bounds>,
        fail_at: Option<usize>,
        cancel_after: Option<(usize, CancellationToken)>,
        captured: Cell<usize>,
    }

    impl FakeScreen {
        fn new(count: usize) -> Self {
            let displays = (0..count)
                .map(|i| Bounds {
                    x: i as i32 * 8,
                    y: 0,
                    width: 8,
                    height: 6,
                })
                .collect();
            Self {
                displays,
                fail_at: None,
                cancel_after: None,
                captured: Cell::new(0),
            }
        }
    }

    impl Screen for FakeScreen {
        fn count(&self) -> usize {
            self.displays.len()
        }

        fn bounds(&self, index: usize) -> Result<Bounds, CaptureError> {
            Ok(self.displays[index])
        }

        fn capture(&self, index: usize, bounds: Bounds) -> Result<RgbaImage, CaptureError> {
            if self.fail_at == Some(index) {
                return Err(CaptureError::Capture {
                    display: index + 1,
                    reason: "display disconnected".to_string(),
                });
            }
            self.captured.set(self.captured.get() + 1);
            if let Some((after, token)) = &self.cancel_after {
                if *after == index {
                    token.cancel();
                }
            }
            Ok(RgbaImage::from_pixel(
                bounds.width,
                bounds.height,
                Rgba([index as u8, 0, 0, 255]),
            ))
        }
    }

    fn config_for(dir: &Path) -> Config {
        Config {
            path: dir.to_str().unwrap().to_string(),
        }
    }

    fn png_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name.ends_with(".png"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_format_timestamp() {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 34, 56).unwrap();
        assert_eq!(format_timestamp(time), TS);
    }

    #[test]
    fn test_format_timestamp_has_no_colons() {
        assert!(!format_timestamp(Utc::now()).contains(':'));
    }

    #[test]
    fn test_saves_one_file_per_display_in_order() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path());
        let screen = FakeScreen::new(3);
        let mut saved = Vec::new();

        let count = Capture::new(&screen, &config)
            .run_at(TS, &CancellationToken::new(), |path| {
                saved.push(path.to_path_buf())
            })
            .unwrap();

        assert_eq!(count, 3);
        let expected: Vec<PathBuf> = (1..=3)
            .map(|i| dir.path().join(format!("{TS}_{i}.png")))
            .collect();
        assert_eq!(saved, expected);
        assert_eq!(
            png_files(dir.path()),
            vec![
                format!("{TS}_1.png"),
                format!("{TS}_2.png"),
                format!("{TS}_3.png")
            ]
        );

        let second = image::open(&expected[1]).unwrap().to_rgba8();
        assert_eq!(second.dimensions(), (8, 6));
        assert_eq!(second.get_pixel(0, 0), &Rgba([1, 0, 0, 255]));
    }

    #[test]
    fn test_no_displays_is_success() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path());
        let screen = FakeScreen::new(0);

        let count = Capture::new(&screen, &config)
            .run(&CancellationToken::new(), |_| panic!("nothing to save"))
            .unwrap();

        assert_eq!(count, 0);
        assert!(png_files(dir.path()).is_empty());
    }

    #[test]
    fn test_run_uses_one_timestamp_for_all_displays() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path());
        let screen = FakeScreen::new(2);

        Capture::new(&screen, &config)
            .run(&CancellationToken::new(), |_| {})
            .unwrap();

        let names = png_files(dir.path());
        assert_eq!(names.len(), 2);
        let prefix = names[0].strip_suffix("_1.png").unwrap();
        assert_eq!(names[1], format!("{prefix}_2.png"));
    }

    #[test]
    fn test_cancelled_before_start_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path());
        let screen = FakeScreen::new(2);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = Capture::new(&screen, &config).run_at(TS, &cancel, |_| {});

        assert!(matches!(result, Err(CaptureError::Cancelled)));
        assert_eq!(screen.captured.get(), 0);
        assert!(png_files(dir.path()).is_empty());
    }

    #[test]
    fn test_cancel_mid_run_keeps_earlier_files() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path());
        let cancel = CancellationToken::new();
        let mut screen = FakeScreen::new(4);
        // 第 2 个显示器截图期间收到取消，当前显示器仍然完成
        screen.cancel_after = Some((1, cancel.clone()));

        let result = Capture::new(&screen, &config).run_at(TS, &cancel, |_| {});

        assert!(matches!(result, Err(CaptureError::Cancelled)));
        assert_eq!(screen.captured.get(), 2);
        assert_eq!(
            png_files(dir.path()),
            vec![format!("{TS}_1.png"), format!("{TS}_2.png")]
        );
    }

    #[test]
    fn test_capture_failure_stops_run() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path());
        let mut screen = FakeScreen::new(3);
        screen.fail_at = Some(1);

        let result = Capture::new(&screen, &config).run_at(TS, &CancellationToken::new(), |_| {});

        match result {
            Err(CaptureError::Capture { display, .. }) => assert_eq!(display, 2),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(png_files(dir.path()), vec![format!("{TS}_1.png")]);
    }

    #[test]
    fn test_missing_output_dir_fails_on_create() {
        let dir = tempdir().unwrap();
        let config = config_for(&dir.path().join("missing"));
        let screen = FakeScreen::new(2);

        let result = Capture::new(&screen, &config).run_at(TS, &CancellationToken::new(), |_| {});

        assert!(matches!(result, Err(CaptureError::Create { .. })));
        assert_eq!(screen.captured.get(), 1);
    }
}
