pub mod images;
pub mod projects;
