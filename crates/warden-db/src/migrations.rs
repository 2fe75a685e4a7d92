use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    if current_version(conn)? < 1 {
        info!("Running migration v1 (global bans + chat settings)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE gbans (
                user_id     INTEGER PRIMARY KEY,
                name        TEXT NOT NULL,
                reason      TEXT
            );

            -- Only chats that touched the setting get a row; no row means enforced
            CREATE TABLE gban_settings (
                chat_id     TEXT PRIMARY KEY,
                enforced    INTEGER NOT NULL DEFAULT 1
            );

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

pub fn current_version(conn: &Connection) -> Result<i64> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rerunning_migrations_is_a_noop() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute(
            "INSERT INTO gbans (user_id, name) VALUES (1, 'kept')",
            [],
        )
        .unwrap();

        run(&conn).unwrap();

        assert_eq!(current_version(&conn).unwrap(), 1);
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM gbans", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn chat_setting_defaults_to_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute("INSERT INTO gban_settings (chat_id) VALUES ('-100')", [])
            .unwrap();

        let enforced: bool = conn
            .query_row(
                "SELECT enforced FROM gban_settings WHERE chat_id = '-100'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!(enforced);
    }
}
