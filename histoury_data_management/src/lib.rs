pub mod database;
pub mod media;
mod data_manager;

pub use data_manager::*;

pub const DATA_DIR: &str = "data/";
pub const DATABASE_FILE: &str = "database.db";
pub const MEDIA_DIR: &str = "media";

#[derive(Debug)]
pub enum DataManagerError {
    Database(String),
    NotFound(String),
    Media(String),
}
