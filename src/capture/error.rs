use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 截图流程中的错误，任何一个都会终止本次运行
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to enumerate displays: {0}")]
    Enumerate(String),

    #[error("Failed to get bounds of display {display}: {reason}")]
    Bounds { display: usize, reason: String },

    #[error("Failed to capture display {display}: {reason}")]
    Capture { display: usize, reason: String },

    #[error("Failed to create {}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Capture cancelled")]
    Cancelled,
}
