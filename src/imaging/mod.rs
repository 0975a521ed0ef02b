pub mod generator;
pub mod output;

pub use generator::{GenerationParams, HttpImageGenerator, ImageGenerator};
pub use output::{save_images, OutputNamer};
