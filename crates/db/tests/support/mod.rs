#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use ledger_core::MembershipCacheRecord;
use ledger_db::Db;
use tempfile::TempDir;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.sqlite");
    let mut db = Db::open(&path).expect("open db");
    db.migrate().expect("migrate db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

pub fn make_record(jwt_sub: &str, team_id: Option<i64>, user_id: i64) -> MembershipCacheRecord {
    MembershipCacheRecord {
        user_id,
        jwt_sub: jwt_sub.to_string(),
        is_team_member: team_id.is_some(),
        team_id,
        last_checked: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
        start_of_month: Utc.with_ymd_and_hms(2025, 2, 14, 8, 30, 0).unwrap(),
    }
}
