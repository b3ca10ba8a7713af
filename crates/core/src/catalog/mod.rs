pub mod collections;
pub mod membership;
pub mod purchases;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::*;
use crate::error::Result;

pub use collections::CollectionKind;
pub use membership::{Membership, ALBUM_PHOTOS, EVENT_ALBUMS};

pub(crate) const PHOTO_COLUMNS: &str = "photos.id, photos.name, photos.path, photos.sha256, photos.created_at";

/// SQLite-backed catalog of photos, albums, events and purchases.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Open or create a catalog at the given path with WAL mode.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let catalog = Self::prepare(conn)?;
        log::info!("opened catalog at {}", path.display());
        Ok(catalog)
    }

    /// Open an in-memory catalog (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::initialize(&conn)?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Close the underlying connection, surfacing any error SQLite reports.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }

    // ── Photos ───────────────────────────────────────────────────────

    /// Insert a photo record unless one already points at `path`.
    /// Returns the record id and whether a new row was created.
    pub fn insert_photo(&self, name: &str, path: &Path, sha256: &str) -> Result<(i64, bool)> {
        let path_str = path.to_string_lossy();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO photos (name, path, sha256, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, path_str.as_ref(), sha256, now()],
        )?;
        if inserted == 1 {
            return Ok((self.conn.last_insert_rowid(), true));
        }
        let id: i64 = self.conn.query_row(
            "SELECT id FROM photos WHERE path = ?1",
            params![path_str.as_ref()],
            |row| row.get(0),
        )?;
        Ok((id, false))
    }

    pub fn get_photo(&self, id: i64) -> Result<Option<Photo>> {
        let photo = self
            .conn
            .query_row(
                &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?1"),
                params![id],
                photo_from_row,
            )
            .optional()?;
        Ok(photo)
    }

    /// All photos, newest first.
    pub fn list_photos(&self) -> Result<Vec<Photo>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos ORDER BY created_at DESC, id DESC"
        ))?;
        let photos = stmt
            .query_map([], photo_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    /// Delete a photo record, returning it if it existed.
    /// Album memberships go with it through the foreign-key cascade.
    pub fn delete_photo(&self, id: i64) -> Result<Option<Photo>> {
        let Some(photo) = self.get_photo(id)? else {
            return Ok(None);
        };
        self.conn
            .execute("DELETE FROM photos WHERE id = ?1", params![id])?;
        Ok(Some(photo))
    }

    /// Resolve photo ids in the given order, each id once, skipping ids with no record.
    pub fn photos_by_ids(&self, ids: &[i64]) -> Result<Vec<Photo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?1"))?;
        let mut seen = std::collections::HashSet::new();
        let mut photos = Vec::with_capacity(ids.len());
        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            if let Some(photo) = stmt.query_row(params![id], photo_from_row).optional()? {
                photos.push(photo);
            }
        }
        Ok(photos)
    }

    pub fn count_photos(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get all catalog statistics in a single query.
    pub fn stats_summary(&self) -> Result<CatalogStats> {
        let stats = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM photos),
                (SELECT COUNT(*) FROM albums),
                (SELECT COUNT(*) FROM events),
                (SELECT COUNT(*) FROM purchases)",
            [],
            |row| {
                Ok(CatalogStats {
                    total_photos: row.get::<_, i64>(0)? as usize,
                    total_albums: row.get::<_, i64>(1)? as usize,
                    total_events: row.get::<_, i64>(2)? as usize,
                    total_purchases: row.get::<_, i64>(3)? as usize,
                })
            },
        )?;
        Ok(stats)
    }

    // ── Config ───────────────────────────────────────────────────

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

#[cfg(test)]
impl Catalog {
    /// Make every later photo insert abort.
    pub(crate) fn reject_photo_inserts(&self) {
        self.conn
            .execute_batch(
                "CREATE TRIGGER reject_photo_insert BEFORE INSERT ON photos
                 BEGIN SELECT RAISE(ABORT, 'photo inserts disabled'); END;",
            )
            .unwrap();
    }
}

pub(crate) fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: row.get(0)?,
        name: row.get(1)?,
        path: PathBuf::from(row.get::<_, String>(2)?),
        sha256: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;

    pub(crate) fn add_photo(catalog: &Catalog, name: &str) -> i64 {
        let path = format!("/store/{name}");
        catalog.insert_photo(name, Path::new(&path), &format!("sha-{name}")).unwrap().0
    }

    // ── Photo tests ──────────────────────────────────────────────

    #[test]
    fn test_insert_photo() {
        let catalog = Catalog::open_in_memory().unwrap();
        let (id, inserted) = catalog
            .insert_photo("beach.jpg", Path::new("/store/aa.jpg"), "aa")
            .unwrap();
        assert!(id > 0);
        assert!(inserted);

        let photo = catalog.get_photo(id).unwrap().unwrap();
        assert_eq!(photo.name, "beach.jpg");
        assert_eq!(photo.path, PathBuf::from("/store/aa.jpg"));
        assert_eq!(photo.sha256, "aa");
    }

    #[test]
    fn test_insert_same_path_is_ignored() {
        let catalog = Catalog::open_in_memory().unwrap();
        let (id1, _) = catalog.insert_photo("a.jpg", Path::new("/store/x.jpg"), "x").unwrap();
        let (id2, inserted) = catalog.insert_photo("b.jpg", Path::new("/store/x.jpg"), "x").unwrap();

        assert_eq!(id1, id2);
        assert!(!inserted);
        assert_eq!(catalog.count_photos().unwrap(), 1);
        assert_eq!(catalog.get_photo(id1).unwrap().unwrap().name, "a.jpg");
    }

    #[test]
    fn test_duplicate_names_are_kept() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog.insert_photo("same.jpg", Path::new("/store/1.jpg"), "1").unwrap();
        catalog.insert_photo("same.jpg", Path::new("/store/2.jpg"), "2").unwrap();
        assert_eq!(catalog.count_photos().unwrap(), 2);
    }

    #[test]
    fn test_list_photos_newest_first() {
        let catalog = Catalog::open_in_memory().unwrap();
        let a = add_photo(&catalog, "a.jpg");
        let b = add_photo(&catalog, "b.jpg");
        let c = add_photo(&catalog, "c.jpg");

        let ids: Vec<i64> = catalog.list_photos().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![c, b, a]);
    }

    #[test]
    fn test_delete_photo() {
        let catalog = Catalog::open_in_memory().unwrap();
        let id = add_photo(&catalog, "a.jpg");

        let removed = catalog.delete_photo(id).unwrap().unwrap();
        assert_eq!(removed.id, id);
        assert!(catalog.get_photo(id).unwrap().is_none());
        assert!(catalog.delete_photo(id).unwrap().is_none());
    }

    #[test]
    fn test_photos_by_ids_keeps_order_and_skips_missing() {
        let catalog = Catalog::open_in_memory().unwrap();
        let a = add_photo(&catalog, "a.jpg");
        let b = add_photo(&catalog, "b.jpg");

        let photos = catalog.photos_by_ids(&[b, 9999, a, b]).unwrap();
        let ids: Vec<i64> = photos.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    // ── Config ──────────────────────────────────────────────────

    #[test]
    fn test_set_and_get_config() {
        let catalog = Catalog::open_in_memory().unwrap();
        assert_eq!(catalog.get_config("storage_path").unwrap(), None);

        catalog.set_config("storage_path", "/tmp/photos").unwrap();
        catalog.set_config("storage_path", "/srv/photos").unwrap();
        assert_eq!(
            catalog.get_config("storage_path").unwrap(),
            Some("/srv/photos".to_string())
        );
    }

    // ── Schema version tracking ─────────────────────────────────

    #[test]
    fn test_schema_version_set_on_fresh_db() {
        let catalog = Catalog::open_in_memory().unwrap();
        let version = catalog.get_config("schema_version").unwrap();
        assert_eq!(version, Some("1".to_string()));
    }

    #[test]
    fn test_reject_future_schema_version() {
        let conn = Connection::open_in_memory().unwrap();
        schema::initialize(&conn).unwrap();
        conn.execute(
            "INSERT INTO config (key, value) VALUES ('schema_version', '999')",
            [],
        )
        .unwrap();

        let err = schema::migrate(&conn).unwrap_err();
        assert!(matches!(err, Error::SchemaTooNew { db: 999, code: 1 }));
    }

    #[test]
    fn test_migration_check_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        schema::initialize(&conn).unwrap();
        schema::migrate(&conn).unwrap();
        schema::migrate(&conn).unwrap();
        let v: String = conn
            .query_row("SELECT value FROM config WHERE key = 'schema_version'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(v, "1");
    }

    // ── Schema structure pinning ────────────────────────────────

    #[test]
    fn test_catalog_tables_exist() {
        let catalog = Catalog::open_in_memory().unwrap();
        let mut stmt = catalog
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(
            tables,
            vec!["album_photos", "albums", "config", "event_albums", "events", "photos", "purchases"]
        );
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let catalog = Catalog::open_in_memory().unwrap();
        let enabled: i64 = catalog
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    // ── Data integrity ──────────────────────────────────────────

    #[test]
    fn test_data_survives_close_and_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("catalog.db");

        let id;
        {
            let catalog = Catalog::open(&db_path).unwrap();
            id = add_photo(&catalog, "keep.jpg");
            catalog.set_config("test_key", "test_value").unwrap();
            catalog.close().unwrap();
        }
        {
            let catalog = Catalog::open(&db_path).unwrap();
            assert_eq!(catalog.get_photo(id).unwrap().unwrap().name, "keep.jpg");
            assert_eq!(catalog.get_config("test_key").unwrap(), Some("test_value".to_string()));
        }
    }
}
