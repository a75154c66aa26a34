mod app;

pub use app::{AppConfig, CONFIG_FILE_NAME, DB_FILE_NAME};
