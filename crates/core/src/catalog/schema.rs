use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS photos (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            path        TEXT NOT NULL UNIQUE,
            sha256      TEXT NOT NULL,
            created_at  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS albums (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL UNIQUE,
            created_at  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS album_photos (
            album_id    INTEGER NOT NULL REFERENCES albums(id) ON DELETE CASCADE,
            photo_id    INTEGER NOT NULL REFERENCES photos(id) ON DELETE CASCADE,
            order_index INTEGER NOT NULL,
            PRIMARY KEY (album_id, photo_id)
        );

        CREATE INDEX IF NOT EXISTS idx_album_photos_photo ON album_photos(photo_id);

        CREATE TABLE IF NOT EXISTS events (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL UNIQUE,
            created_at  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS event_albums (
            event_id    INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
            album_id    INTEGER NOT NULL REFERENCES albums(id) ON DELETE CASCADE,
            order_index INTEGER NOT NULL,
            PRIMARY KEY (event_id, album_id)
        );

        CREATE INDEX IF NOT EXISTS idx_event_albums_album ON event_albums(album_id);

        CREATE TABLE IF NOT EXISTS purchases (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            photo_ids   TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'pending',
            created_at  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS config (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

/// Stamp a fresh catalog with the current schema version and refuse catalogs
/// written by a newer build.
pub fn migrate(conn: &Connection) -> Result<()> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM config WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match stored.and_then(|v| v.parse::<u32>().ok()) {
        None => {
            conn.execute(
                "INSERT OR REPLACE INTO config (key, value) VALUES ('schema_version', ?1)",
                params![SCHEMA_VERSION.to_string()],
            )?;
        }
        Some(db) if db > SCHEMA_VERSION => {
            return Err(Error::SchemaTooNew {
                db,
                code: SCHEMA_VERSION,
            });
        }
        Some(_) => {}
    }
    Ok(())
}
