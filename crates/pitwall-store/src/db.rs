use rusqlite::Connection;

use crate::error::Result;

/// Initialise the aggregate tables in `conn`.
///
/// Safe to call on every startup; it uses `IF NOT EXISTS` throughout.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS custom_races (
            id          TEXT NOT NULL PRIMARY KEY,
            name        TEXT NOT NULL,
            data        TEXT NOT NULL,   -- JSON-encoded CustomRace
            deleted_at  TEXT,            -- soft delete, ISO-8601 or NULL
            updated_at  TEXT NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS championships (
            id          TEXT NOT NULL PRIMARY KEY,
            name        TEXT NOT NULL,
            data        TEXT NOT NULL,   -- JSON-encoded Championship incl. events
            deleted_at  TEXT,
            updated_at  TEXT NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS race_weekends (
            id          TEXT NOT NULL PRIMARY KEY,
            name        TEXT NOT NULL,
            data        TEXT NOT NULL,   -- JSON-encoded RaceWeekend incl. sessions
            deleted_at  TEXT,
            updated_at  TEXT NOT NULL
        ) STRICT;

        -- Single row, id is always 1.
        CREATE TABLE IF NOT EXISTS server_options (
            id          INTEGER NOT NULL PRIMARY KEY CHECK (id = 1),
            data        TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL
        ) STRICT;
        ",
    )?;
    Ok(())
}
