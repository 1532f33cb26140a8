use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ledger_core::{MembershipCacheRecord, TeamMembershipRecord};
use ledger_db::Db;

use crate::error::{AppError, Result};
use crate::services::MembershipStore;

/// Holds at most one membership record for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
    slot: Mutex<Option<TeamMembershipRecord>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> AppError {
    AppError::Message("membership store lock poisoned".to_string())
}

impl MembershipStore for InMemoryMembershipStore {
    fn get(&self, subject_id: &str) -> Result<Option<TeamMembershipRecord>> {
        let slot = self.slot.lock().map_err(|_| poisoned())?;
        Ok(slot
            .as_ref()
            .filter(|record| record.subject_id == subject_id)
            .cloned())
    }

    fn put(&self, record: &TeamMembershipRecord) -> Result<()> {
        let mut slot = self.slot.lock().map_err(|_| poisoned())?;
        *slot = Some(record.clone());
        Ok(())
    }
}

/// Single JSON document in the cache record shape.
#[derive(Debug, Clone)]
pub struct JsonFileMembershipStore {
    path: PathBuf,
}

impl JsonFileMembershipStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MembershipStore for JsonFileMembershipStore {
    fn get(&self, subject_id: &str) -> Result<Option<TeamMembershipRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let cached: MembershipCacheRecord = serde_json::from_str(&contents)?;
        if cached.jwt_sub != subject_id {
            return Ok(None);
        }
        Ok(Some(cached.into()))
    }

    fn put(&self, record: &TeamMembershipRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let cached = MembershipCacheRecord::from(record);
        let contents = serde_json::to_string_pretty(&cached)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// Membership cache kept in the ledger database.
pub struct SqliteMembershipStore {
    db: Mutex<Db>,
}

impl SqliteMembershipStore {
    pub fn new(db: Db) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Opens and migrates the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut db = Db::open(path)?;
        db.migrate()?;
        Ok(Self::new(db))
    }
}

impl MembershipStore for SqliteMembershipStore {
    fn get(&self, subject_id: &str) -> Result<Option<TeamMembershipRecord>> {
        let db = self.db.lock().map_err(|_| poisoned())?;
        Ok(db.get_membership(subject_id)?.map(TeamMembershipRecord::from))
    }

    fn put(&self, record: &TeamMembershipRecord) -> Result<()> {
        let mut db = self.db.lock().map_err(|_| poisoned())?;
        db.put_membership(&MembershipCacheRecord::from(record))?;
        Ok(())
    }
}
