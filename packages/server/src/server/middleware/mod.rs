// HTTP middleware
pub mod body_tap;

pub use body_tap::*;
