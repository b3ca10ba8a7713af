use rusqlite::{params, OptionalExtension, Row};

use super::membership::{Membership, ALBUM_PHOTOS, EVENT_ALBUMS};
use super::{now, photo_from_row, Catalog, PHOTO_COLUMNS};
use crate::domain::*;
use crate::error::{unique_or, Error, Result};

/// The two kinds of named, ordered containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Album,
    Event,
}

impl CollectionKind {
    pub fn table(&self) -> &'static str {
        match self {
            CollectionKind::Album => "albums",
            CollectionKind::Event => "events",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CollectionKind::Album => "album",
            CollectionKind::Event => "event",
        }
    }

    /// The membership relation this kind is the parent of.
    pub fn membership(&self) -> &'static Membership {
        match self {
            CollectionKind::Album => &ALBUM_PHOTOS,
            CollectionKind::Event => &EVENT_ALBUMS,
        }
    }

    pub(crate) fn not_found(&self, id: i64) -> Error {
        match self {
            CollectionKind::Album => Error::AlbumNotFound(id),
            CollectionKind::Event => Error::EventNotFound(id),
        }
    }
}

fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidName);
    }
    Ok(trimmed)
}

fn album_from_row(row: &Row<'_>) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

impl Catalog {
    pub fn create_collection(&self, kind: CollectionKind, name: &str) -> Result<i64> {
        let name = validate_name(name)?;
        self.conn
            .execute(
                &format!("INSERT INTO {} (name, created_at) VALUES (?1, ?2)", kind.table()),
                params![name, now()],
            )
            .map_err(|e| unique_or(kind.label(), name, e))?;
        let id = self.conn.last_insert_rowid();
        log::info!("created {} {name:?} ({id})", kind.label());
        Ok(id)
    }

    /// Returns false when `id` is unknown.
    pub fn rename_collection(&self, kind: CollectionKind, id: i64, new_name: &str) -> Result<bool> {
        let new_name = validate_name(new_name)?;
        let changed = self
            .conn
            .execute(
                &format!("UPDATE {} SET name = ?1 WHERE id = ?2", kind.table()),
                params![new_name, id],
            )
            .map_err(|e| unique_or(kind.label(), new_name, e))?;
        Ok(changed > 0)
    }

    /// Delete an album or event. Membership rows on both sides cascade.
    pub fn delete_collection(&self, kind: CollectionKind, id: i64) -> Result<bool> {
        let removed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
            params![id],
        )?;
        if removed > 0 {
            log::info!("deleted {} {id}", kind.label());
        }
        Ok(removed > 0)
    }

    /// All collections of a kind, newest first, with their member counts.
    pub fn list_collections(&self, kind: CollectionKind) -> Result<Vec<CollectionSummary>> {
        let rel = kind.membership();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT c.id, c.name, c.created_at, COUNT(m.{member})
             FROM {table} c
             LEFT JOIN {members} m ON m.{parent} = c.id
             GROUP BY c.id
             ORDER BY c.created_at DESC, c.id DESC",
            table = kind.table(),
            members = rel.table,
            parent = rel.parent_column,
            member = rel.member_column,
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CollectionSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                    member_count: row.get::<_, i64>(3)? as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn collection_exists(&self, kind: CollectionKind, id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT id FROM {} WHERE id = ?1", kind.table()),
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get_album(&self, id: i64) -> Result<Option<Album>> {
        let album = self
            .conn
            .query_row(
                "SELECT id, name, created_at FROM albums WHERE id = ?1",
                params![id],
                album_from_row,
            )
            .optional()?;
        Ok(album)
    }

    pub fn get_event(&self, id: i64) -> Result<Option<Event>> {
        let event = self
            .conn
            .query_row(
                "SELECT id, name, created_at FROM events WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Event {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(event)
    }

    /// Photos of an album in display order.
    pub fn album_photos(&self, album_id: i64) -> Result<Vec<Ordered<Photo>>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PHOTO_COLUMNS}, ap.order_index
             FROM photos
             JOIN album_photos ap ON ap.photo_id = photos.id
             WHERE ap.album_id = ?1
             ORDER BY ap.order_index, photos.id"
        ))?;
        let rows = stmt
            .query_map(params![album_id], |row| {
                Ok(Ordered {
                    item: photo_from_row(row)?,
                    order_index: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Albums of an event in display order.
    pub fn event_albums(&self, event_id: i64) -> Result<Vec<Ordered<Album>>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.name, a.created_at, ea.order_index
             FROM albums a
             JOIN event_albums ea ON ea.album_id = a.id
             WHERE ea.event_id = ?1
             ORDER BY ea.order_index, a.id",
        )?;
        let rows = stmt
            .query_map(params![event_id], |row| {
                Ok(Ordered {
                    item: album_from_row(row)?,
                    order_index: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// First photo of an album, if any.
    pub fn album_cover(&self, album_id: i64) -> Result<Option<Photo>> {
        let cover = self
            .conn
            .query_row(
                &format!(
                    "SELECT {PHOTO_COLUMNS}
                     FROM photos
                     JOIN album_photos ap ON ap.photo_id = photos.id
                     WHERE ap.album_id = ?1
                     ORDER BY ap.order_index, photos.id
                     LIMIT 1"
                ),
                params![album_id],
                photo_from_row,
            )
            .optional()?;
        Ok(cover)
    }

    /// First album of an event, if any.
    pub fn event_cover(&self, event_id: i64) -> Result<Option<Album>> {
        let cover = self
            .conn
            .query_row(
                "SELECT a.id, a.name, a.created_at
                 FROM albums a
                 JOIN event_albums ea ON ea.album_id = a.id
                 WHERE ea.event_id = ?1
                 ORDER BY ea.order_index, a.id
                 LIMIT 1",
                params![event_id],
                album_from_row,
            )
            .optional()?;
        Ok(cover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::add_photo;

    #[test]
    fn test_create_and_get_album() {
        let catalog = Catalog::open_in_memory().unwrap();
        let id = catalog.create_collection(CollectionKind::Album, "Wedding").unwrap();

        let album = catalog.get_album(id).unwrap().unwrap();
        assert_eq!(album.name, "Wedding");
        assert!(catalog.get_event(id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog.create_collection(CollectionKind::Album, "X").unwrap();
        let err = catalog.create_collection(CollectionKind::Album, "X").unwrap_err();
        assert!(matches!(err, Error::UniqueViolation { kind: "album", ref name } if name == "X"));
    }

    #[test]
    fn test_same_name_allowed_across_kinds() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog.create_collection(CollectionKind::Album, "Summer").unwrap();
        catalog.create_collection(CollectionKind::Event, "Summer").unwrap();
    }

    #[test]
    fn test_name_reusable_after_delete() {
        let catalog = Catalog::open_in_memory().unwrap();
        let id = catalog.create_collection(CollectionKind::Event, "Gala").unwrap();
        assert!(catalog.delete_collection(CollectionKind::Event, id).unwrap());
        catalog.create_collection(CollectionKind::Event, "Gala").unwrap();
    }

    #[test]
    fn test_blank_name_rejected() {
        let catalog = Catalog::open_in_memory().unwrap();
        let err = catalog.create_collection(CollectionKind::Album, "   ").unwrap_err();
        assert!(matches!(err, Error::InvalidName));
    }

    #[test]
    fn test_rename() {
        let catalog = Catalog::open_in_memory().unwrap();
        let id = catalog.create_collection(CollectionKind::Album, "Old").unwrap();
        assert!(catalog.rename_collection(CollectionKind::Album, id, "New").unwrap());
        assert_eq!(catalog.get_album(id).unwrap().unwrap().name, "New");
        assert!(!catalog.rename_collection(CollectionKind::Album, 9999, "Other").unwrap());
    }

    #[test]
    fn test_rename_to_taken_name_rejected() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog.create_collection(CollectionKind::Album, "A").unwrap();
        let b = catalog.create_collection(CollectionKind::Album, "B").unwrap();
        let err = catalog.rename_collection(CollectionKind::Album, b, "A").unwrap_err();
        assert!(matches!(err, Error::UniqueViolation { .. }));
    }

    #[test]
    fn test_delete_unknown_returns_false() {
        let catalog = Catalog::open_in_memory().unwrap();
        assert!(!catalog.delete_collection(CollectionKind::Album, 42).unwrap());
    }

    #[test]
    fn test_list_with_member_counts() {
        let catalog = Catalog::open_in_memory().unwrap();
        let empty = catalog.create_collection(CollectionKind::Album, "Empty").unwrap();
        let full = catalog.create_collection(CollectionKind::Album, "Full").unwrap();
        let a = add_photo(&catalog, "a.jpg");
        let b = add_photo(&catalog, "b.jpg");
        catalog.attach(&ALBUM_PHOTOS, full, a, 0).unwrap();
        catalog.attach(&ALBUM_PHOTOS, full, b, 1).unwrap();

        let list = catalog.list_collections(CollectionKind::Album).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!((list[0].id, list[0].member_count), (full, 2));
        assert_eq!((list[1].id, list[1].member_count), (empty, 0));
    }

    #[test]
    fn test_deleting_photo_cascades_to_every_album() {
        let catalog = Catalog::open_in_memory().unwrap();
        let a1 = catalog.create_collection(CollectionKind::Album, "One").unwrap();
        let a2 = catalog.create_collection(CollectionKind::Album, "Two").unwrap();
        let photo = add_photo(&catalog, "shared.jpg");
        let other = add_photo(&catalog, "other.jpg");
        catalog.attach(&ALBUM_PHOTOS, a1, photo, 0).unwrap();
        catalog.attach(&ALBUM_PHOTOS, a1, other, 1).unwrap();
        catalog.attach(&ALBUM_PHOTOS, a2, photo, 0).unwrap();

        catalog.delete_photo(photo).unwrap();

        assert_eq!(catalog.members(&ALBUM_PHOTOS, a1).unwrap(), vec![(other, 1)]);
        assert!(catalog.members(&ALBUM_PHOTOS, a2).unwrap().is_empty());
    }

    #[test]
    fn test_deleting_album_cascades_to_every_event() {
        let catalog = Catalog::open_in_memory().unwrap();
        let album = catalog.create_collection(CollectionKind::Album, "Ceremony").unwrap();
        let e1 = catalog.create_collection(CollectionKind::Event, "Day 1").unwrap();
        let e2 = catalog.create_collection(CollectionKind::Event, "Day 2").unwrap();
        let photo = add_photo(&catalog, "a.jpg");
        catalog.attach(&ALBUM_PHOTOS, album, photo, 0).unwrap();
        catalog.attach(&EVENT_ALBUMS, e1, album, 0).unwrap();
        catalog.attach(&EVENT_ALBUMS, e2, album, 0).unwrap();

        catalog.delete_collection(CollectionKind::Album, album).unwrap();

        assert!(catalog.members(&EVENT_ALBUMS, e1).unwrap().is_empty());
        assert!(catalog.members(&EVENT_ALBUMS, e2).unwrap().is_empty());
        assert!(catalog.members(&ALBUM_PHOTOS, album).unwrap().is_empty());
        // The photo itself is untouched.
        assert!(catalog.get_photo(photo).unwrap().is_some());
    }

    #[test]
    fn test_covers() {
        let catalog = Catalog::open_in_memory().unwrap();
        let album = catalog.create_collection(CollectionKind::Album, "A").unwrap();
        let event = catalog.create_collection(CollectionKind::Event, "E").unwrap();
        assert!(catalog.album_cover(album).unwrap().is_none());
        assert!(catalog.event_cover(event).unwrap().is_none());

        let first = add_photo(&catalog, "first.jpg");
        let second = add_photo(&catalog, "second.jpg");
        catalog.attach(&ALBUM_PHOTOS, album, second, 1).unwrap();
        catalog.attach(&ALBUM_PHOTOS, album, first, 0).unwrap();
        catalog.attach(&EVENT_ALBUMS, event, album, 0).unwrap();

        assert_eq!(catalog.album_cover(album).unwrap().unwrap().id, first);
        assert_eq!(catalog.event_cover(event).unwrap().unwrap().id, album);
    }

    #[test]
    fn test_album_photos_in_order() {
        let catalog = Catalog::open_in_memory().unwrap();
        let album = catalog.create_collection(CollectionKind::Album, "A").unwrap();
        let a = add_photo(&catalog, "a.jpg");
        let b = add_photo(&catalog, "b.jpg");
        catalog.attach(&ALBUM_PHOTOS, album, a, 1).unwrap();
        catalog.attach(&ALBUM_PHOTOS, album, b, 0).unwrap();

        let photos = catalog.album_photos(album).unwrap();
        let got: Vec<(i64, i64)> = photos.iter().map(|o| (o.item.id, o.order_index)).collect();
        assert_eq!(got, vec![(b, 0), (a, 1)]);
    }
}
