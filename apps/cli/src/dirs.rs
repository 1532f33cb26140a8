use std::path::PathBuf;

use crate::config::CacheBackend;

const DATA_DIR_NAME: &str = "usage-ledger";
const DB_FILE_NAME: &str = "usage-ledger.sqlite";
const JSON_CACHE_FILE_NAME: &str = "team-membership.json";

#[derive(Debug, Clone)]
pub struct DataDirResolution {
    pub dir: PathBuf,
    pub matched_existing: bool,
}

impl DataDirResolution {
    /// Cache location for `backend`; `None` for the in-process cache.
    pub fn cache_path(&self, backend: CacheBackend) -> Option<PathBuf> {
        match backend {
            CacheBackend::Memory => None,
            CacheBackend::Json => Some(self.dir.join(JSON_CACHE_FILE_NAME)),
            CacheBackend::Sqlite => Some(self.dir.join(DB_FILE_NAME)),
        }
    }
}

pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<DataDirResolution, String> {
    let dir = match explicit {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    let matched_existing =
        dir.join(DB_FILE_NAME).exists() || dir.join(JSON_CACHE_FILE_NAME).exists();
    Ok(DataDirResolution {
        dir,
        matched_existing,
    })
}

fn default_data_dir() -> Result<PathBuf, String> {
    if let Some(dir) = std::env::var_os("XDG_DATA_HOME").filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir).join(DATA_DIR_NAME));
    }
    let home = std::env::var("HOME").map_err(|err| format!("resolve HOME: {}", err))?;
    let home = PathBuf::from(home);
    if cfg!(target_os = "macos") {
        Ok(home
            .join("Library")
            .join("Application Support")
            .join(DATA_DIR_NAME))
    } else {
        Ok(home.join(".local").join("share").join(DATA_DIR_NAME))
    }
}
