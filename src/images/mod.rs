mod pipeline;
mod resolver;

pub use pipeline::{ImageOptions, ImagePipeline};
pub use resolver::{BlobImage, ImageResolver, ImageSource};
