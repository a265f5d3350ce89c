pub mod errors;
pub mod services;
pub mod state;

pub use errors::ImageError;
pub use services::{ImageService, ImageServiceConfig};
pub use state::AppState;
