use std::path::PathBuf;

use crate::store::DEFAULT_CACHE_KEY;

pub const DEFAULT_STORE_PATH: &str = ".store/transcript.json";
pub const DEFAULT_CURRICULUM_PATH: &str = "demos/curriculum.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres backend when set, local JSON file otherwise.
    pub database_url: Option<String>,
    pub store_path: PathBuf,
    pub cache_key: String,
    pub curriculum_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            store_path: std::env::var("TRANSCRIPT_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH)),
            cache_key: std::env::var("TRANSCRIPT_CACHE_KEY")
                .unwrap_or_else(|_| DEFAULT_CACHE_KEY.to_string()),
            curriculum_path: std::env::var("CURRICULUM_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CURRICULUM_PATH)),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            curriculum_path: PathBuf::from(DEFAULT_CURRICULUM_PATH),
        }
    }
}
