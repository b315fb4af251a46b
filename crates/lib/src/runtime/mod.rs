//! Closed value sets for runtime backends and image-function runtimes.

mod image;
mod mode;

pub use image::*;
pub use mode::*;
