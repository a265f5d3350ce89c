mod images;
mod locks;

pub use images::{ImageService, ImageServiceConfig};
