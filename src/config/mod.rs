#[allow(clippy::module_inception)]
mod config;
pub mod init;

pub use config::*;
