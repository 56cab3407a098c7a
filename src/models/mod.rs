pub mod generation;
pub mod image;
pub mod stream;

pub use generation::*;
pub use image::*;
pub use stream::*;
