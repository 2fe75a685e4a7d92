use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{BannedUserRow, ChatSettingRow};
use crate::{Database, Result};

impl Database {
    // -- Global bans --

    pub fn banned_user(&self, user_id: i64) -> Result<Option<BannedUserRow>> {
        self.with_conn(|conn| find_banned_user(conn, user_id))
    }

    pub fn banned_users(&self) -> Result<Vec<BannedUserRow>> {
        self.with_conn(all_banned_users)
    }

    pub fn banned_user_ids(&self) -> Result<Vec<i64>> {
        self.with_conn(all_banned_user_ids)
    }

    // -- Chat enforcement settings --

    pub fn chat_setting(&self, chat_id: &str) -> Result<Option<ChatSettingRow>> {
        self.with_conn(|conn| find_chat_setting(conn, chat_id))
    }

    pub fn chat_settings(&self) -> Result<Vec<ChatSettingRow>> {
        self.with_conn(all_chat_settings)
    }

    pub fn opted_out_chat_ids(&self) -> Result<Vec<String>> {
        self.with_conn(all_opted_out_chat_ids)
    }
}

fn banned_user_from_row(row: &Row<'_>) -> rusqlite::Result<BannedUserRow> {
    Ok(BannedUserRow {
        user_id: row.get(0)?,
        name: row.get(1)?,
        reason: row.get(2)?,
    })
}

fn chat_setting_from_row(row: &Row<'_>) -> rusqlite::Result<ChatSettingRow> {
    Ok(ChatSettingRow {
        chat_id: row.get(0)?,
        enforced: row.get(1)?,
    })
}

pub fn find_banned_user(conn: &Connection, user_id: i64) -> Result<Option<BannedUserRow>> {
    let row = conn
        .query_row(
            "SELECT user_id, name, reason FROM gbans WHERE user_id = ?1",
            [user_id],
            banned_user_from_row,
        )
        .optional()?;

    Ok(row)
}

pub fn all_banned_users(conn: &Connection) -> Result<Vec<BannedUserRow>> {
    let mut stmt = conn.prepare("SELECT user_id, name, reason FROM gbans ORDER BY user_id")?;

    let rows = stmt
        .query_map([], banned_user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn all_banned_user_ids(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT user_id FROM gbans")?;

    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ids)
}

/// Insert the row, or replace name and reason if the user is already banned.
pub fn upsert_banned_user(conn: &Connection, user: &BannedUserRow) -> Result<()> {
    conn.execute(
        "INSERT INTO gbans (user_id, name, reason) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET name = excluded.name, reason = excluded.reason",
        rusqlite::params![user.user_id, user.name, user.reason],
    )?;
    Ok(())
}

/// Returns whether a row was removed.
pub fn delete_banned_user(conn: &Connection, user_id: i64) -> Result<bool> {
    let removed = conn.execute("DELETE FROM gbans WHERE user_id = ?1", [user_id])?;
    Ok(removed > 0)
}

pub fn find_chat_setting(conn: &Connection, chat_id: &str) -> Result<Option<ChatSettingRow>> {
    let row = conn
        .query_row(
            "SELECT chat_id, enforced FROM gban_settings WHERE chat_id = ?1",
            [chat_id],
            chat_setting_from_row,
        )
        .optional()?;

    Ok(row)
}

pub fn all_chat_settings(conn: &Connection) -> Result<Vec<ChatSettingRow>> {
    let mut stmt = conn.prepare("SELECT chat_id, enforced FROM gban_settings ORDER BY chat_id")?;

    let rows = stmt
        .query_map([], chat_setting_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn all_opted_out_chat_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT chat_id FROM gban_settings WHERE enforced = 0")?;

    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ids)
}

pub fn upsert_chat_setting(conn: &Connection, setting: &ChatSettingRow) -> Result<()> {
    conn.execute(
        "INSERT INTO gban_settings (chat_id, enforced) VALUES (?1, ?2)
         ON CONFLICT(chat_id) DO UPDATE SET enforced = excluded.enforced",
        rusqlite::params![setting.chat_id, setting.enforced],
    )?;
    Ok(())
}

/// Move the setting stored under `old_chat_id` to `new_chat_id`, replacing
/// any setting already stored there. Returns whether a row was moved.
pub fn rekey_chat_setting(conn: &Connection, old_chat_id: &str, new_chat_id: &str) -> Result<bool> {
    let moved = conn.execute(
        "UPDATE OR REPLACE gban_settings SET chat_id = ?2 WHERE chat_id = ?1",
        [old_chat_id, new_chat_id],
    )?;
    Ok(moved > 0)
}
