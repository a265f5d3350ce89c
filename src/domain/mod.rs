pub mod errors;
pub mod ids;
pub mod images;
pub mod projects;
pub mod repositories;

pub use errors::RepositoryError;
