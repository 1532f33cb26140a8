use chrono::{DateTime, SecondsFormat, Utc};
use ledger_core::MembershipCacheRecord;
use rusqlite::{Row, params};

use crate::Db;
use crate::error::{DbError, Result};

impl Db {
    pub fn get_membership(&self, jwt_sub: &str) -> Result<Option<MembershipCacheRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT jwt_sub, user_id, is_team_member, team_id, last_checked_ms, start_of_month
            FROM team_membership_cache
            WHERE jwt_sub = ?1
            "#,
        )?;
        let mut rows = stmt.query([jwt_sub])?;
        if let Some(row) = rows.next()? {
            Ok(Some(membership_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Replaces any entry cached for another subject.
    pub fn put_membership(&mut self, record: &MembershipCacheRecord) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM team_membership_cache WHERE jwt_sub <> ?1",
            [&record.jwt_sub],
        )?;
        tx.execute(
            r#"
            INSERT INTO team_membership_cache (
              jwt_sub, user_id, is_team_member, team_id, last_checked_ms, start_of_month
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(jwt_sub) DO UPDATE SET
              user_id = excluded.user_id,
              is_team_member = excluded.is_team_member,
              team_id = excluded.team_id,
              last_checked_ms = excluded.last_checked_ms,
              start_of_month = excluded.start_of_month
            "#,
            params![
                record.jwt_sub,
                record.user_id,
                record.is_team_member,
                record.team_id,
                record.last_checked.timestamp_millis(),
                record
                    .start_of_month
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn clear_membership(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM team_membership_cache", [])?)
    }

    pub fn count_memberships(&self) -> Result<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM team_membership_cache", [], |row| {
                    row.get(0)
                })?;
        Ok(count as u64)
    }
}

fn membership_from_row(row: &Row<'_>) -> Result<MembershipCacheRecord> {
    let last_checked_ms: i64 = row.get(4)?;
    let last_checked = DateTime::<Utc>::from_timestamp_millis(last_checked_ms).ok_or_else(|| {
        DbError::InvalidRecord(format!("last_checked out of range: {}", last_checked_ms))
    })?;
    let start_of_month: String = row.get(5)?;
    let start_of_month = DateTime::parse_from_rfc3339(&start_of_month)?.with_timezone(&Utc);
    Ok(MembershipCacheRecord {
        jwt_sub: row.get(0)?,
        user_id: row.get(1)?,
        is_team_member: row.get(2)?,
        team_id: row.get(3)?,
        last_checked,
        start_of_month,
    })
}
