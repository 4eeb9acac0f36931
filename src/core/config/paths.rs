use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Scratch directory for uploads waiting to be indexed.
    pub upload_dir: PathBuf,
    pub db_path: PathBuf,
    pub chunk_db_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        Self::at(discover_user_data_dir())
    }

    pub fn at(user_data_dir: impl AsRef<Path>) -> Self {
        let user_data_dir = user_data_dir.as_ref().to_path_buf();
        let log_dir = user_data_dir.join("logs");
        let upload_dir = user_data_dir.join("documents");
        let db_path = user_data_dir.join("docqa.db");
        let chunk_db_path = user_data_dir.join("chunks.db");

        for dir in [&user_data_dir, &log_dir, &upload_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            user_data_dir,
            log_dir,
            upload_dir,
            db_path,
            chunk_db_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_user_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("DOCQA_DATA_DIR") {
        return PathBuf::from(dir);
    }

    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("data")
}
