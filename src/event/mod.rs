mod capture_result;

pub use capture_result::*;
