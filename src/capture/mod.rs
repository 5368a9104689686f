#[allow(clippy::module_inception)]
pub mod capture;
pub mod error;
pub mod monitor;

pub use capture::*;
pub use error::*;
pub use monitor::*;
