pub mod bridge;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod scanner;
pub mod storage;

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use catalog::{Catalog, CollectionKind, ALBUM_PHOTOS, EVENT_ALBUMS};
use domain::*;
use error::{Error, Result};
use storage::{PhotoStorage, StagedFile};

const STORAGE_PATH_KEY: &str = "storage_path";
const STATUS_POLICY_KEY: &str = "status_policy";

/// Callback events for a directory import.
pub enum ImportProgress {
    /// Import started with the number of image files found.
    Start { total: usize },
    /// A new photo record was created.
    Imported { name: String },
    /// The file's content is already catalogued.
    Skipped { name: String },
    /// The file could not be staged or recorded.
    Failed { name: String, reason: String },
    /// Import finished.
    Complete { imported: usize, skipped: usize, failed: usize },
}

/// The main entry point: owns the catalog handle and the managed photo storage.
pub struct Vault {
    catalog: Catalog,
    storage: PhotoStorage,
    policy: TransitionPolicy,
}

impl Vault {
    /// Open or create a vault at the given catalog path.
    ///
    /// Photos are stored in the directory recorded in the catalog, or in a
    /// `photos/` directory next to the catalog file on first use.
    pub fn open(catalog_path: &Path) -> Result<Self> {
        let catalog = Catalog::open(catalog_path)?;
        let storage_dir = match catalog.get_config(STORAGE_PATH_KEY)? {
            Some(dir) => PathBuf::from(dir),
            None => {
                let dir = default_storage_dir(catalog_path)?;
                catalog.set_config(STORAGE_PATH_KEY, &dir.to_string_lossy())?;
                dir
            }
        };
        let storage = PhotoStorage::new(&storage_dir)?;
        Self::new(catalog, storage)
    }

    /// Assemble a vault from an already opened catalog and storage.
    pub fn new(catalog: Catalog, storage: PhotoStorage) -> Result<Self> {
        let policy = match catalog.get_config(STATUS_POLICY_KEY)? {
            Some(value) => value.parse().unwrap_or_else(|err| {
                log::warn!("{err}; falling back to permissive");
                TransitionPolicy::Permissive
            }),
            None => TransitionPolicy::default(),
        };
        Ok(Self {
            catalog,
            storage,
            policy,
        })
    }

    pub fn close(self) -> Result<()> {
        self.catalog.close()
    }

    // ── Configuration ────────────────────────────────────────────────

    pub fn storage_path(&self) -> &Path {
        self.storage.root()
    }

    /// Move future imports to `dir`. Photos already stored keep their paths.
    pub fn set_storage_path(&mut self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let canonical = dir.canonicalize()?;
        let storage = PhotoStorage::new(&canonical)?;
        self.catalog
            .set_config(STORAGE_PATH_KEY, &canonical.to_string_lossy())?;
        self.storage = storage;
        log::info!("photo storage moved to {}", canonical.display());
        Ok(())
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        self.policy
    }

    pub fn set_transition_policy(&mut self, policy: TransitionPolicy) -> Result<()> {
        self.catalog.set_config(STATUS_POLICY_KEY, policy.as_str())?;
        self.policy = policy;
        Ok(())
    }

    pub fn status(&self) -> Result<CatalogStats> {
        self.catalog.stats_summary()
    }

    // ── Files ────────────────────────────────────────────────────────

    pub fn list_image_files(&self, dir: &Path) -> Result<Vec<String>> {
        scanner::list_image_files(dir)
    }

    pub fn read_file_base64(&self, path: &Path) -> Result<String> {
        storage::read_base64(path)
    }

    // ── Photos ───────────────────────────────────────────────────────

    /// Copy `source` into storage and record it under `name`.
    /// Content that is already catalogued resolves to the existing record's id.
    pub fn add_photo(&self, name: &str, source: &Path) -> Result<i64> {
        let staged = self.storage.stage(source)?;
        let (id, _) = self.record(name, staged)?;
        Ok(id)
    }

    fn record(&self, name: &str, staged: StagedFile) -> Result<(i64, bool)> {
        match self.catalog.insert_photo(name, &staged.path, &staged.sha256) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.storage.discard(&staged);
                Err(err)
            }
        }
    }

    /// Import every image file directly inside `dir`.
    /// Files are copied in parallel; records are written one by one afterwards.
    pub fn import_directory(
        &self,
        dir: &Path,
        mut progress_cb: Option<&mut dyn FnMut(ImportProgress)>,
    ) -> Result<ImportReport> {
        let names = scanner::list_image_files(dir)?;
        log::info!("importing {} files from {}", names.len(), dir.display());

        if let Some(ref mut cb) = progress_cb {
            cb(ImportProgress::Start { total: names.len() });
        }

        // Stage in parallel (no DB access here)
        let storage = &self.storage;
        let staged: Vec<(String, Result<StagedFile>)> = names
            .into_par_iter()
            .map(|name| {
                let result = storage.stage(&dir.join(&name));
                (name, result)
            })
            .collect();

        // Report sequentially (callback is not Send)
        let mut report = ImportReport::default();
        for (name, result) in staged {
            match result.and_then(|file| self.record(&name, file)) {
                Ok((_, true)) => {
                    report.imported += 1;
                    if let Some(ref mut cb) = progress_cb {
                        cb(ImportProgress::Imported { name });
                    }
                }
                Ok((_, false)) => {
                    report.skipped += 1;
                    if let Some(ref mut cb) = progress_cb {
                        cb(ImportProgress::Skipped { name });
                    }
                }
                Err(err) => {
                    log::warn!("import of {name} failed: {err}");
                    let reason = err.to_string();
                    if let Some(ref mut cb) = progress_cb {
                        cb(ImportProgress::Failed {
                            name: name.clone(),
                            reason: reason.clone(),
                        });
                    }
                    report.failed.push(ImportFailure { name, reason });
                }
            }
        }

        if let Some(ref mut cb) = progress_cb {
            cb(ImportProgress::Complete {
                imported: report.imported,
                skipped: report.skipped,
                failed: report.failed.len(),
            });
        }
        Ok(report)
    }

    /// All photos, newest first, with their file content attached.
    pub fn photos(&self) -> Result<Vec<LoadedPhoto>> {
        self.catalog.list_photos()?.into_iter().map(load).collect()
    }

    /// All photo records, newest first, without reading any file.
    pub fn photo_records(&self) -> Result<Vec<Photo>> {
        self.catalog.list_photos()
    }

    pub fn photo(&self, id: i64) -> Result<Option<Photo>> {
        self.catalog.get_photo(id)
    }

    /// Delete a photo record and, best effort, its stored file.
    /// Returns false when `id` is unknown.
    pub fn delete_photo(&self, id: i64) -> Result<bool> {
        let Some(photo) = self.catalog.delete_photo(id)? else {
            return Ok(false);
        };
        self.storage.remove(&photo.path);
        log::info!("deleted photo {id} ({})", photo.name);
        Ok(true)
    }

    // ── Albums ───────────────────────────────────────────────────────

    pub fn create_album(&self, name: &str) -> Result<i64> {
        self.catalog.create_collection(CollectionKind::Album, name)
    }

    pub fn rename_album(&self, id: i64, new_name: &str) -> Result<bool> {
        self.catalog
            .rename_collection(CollectionKind::Album, id, new_name)
    }

    pub fn delete_album(&self, id: i64) -> Result<bool> {
        self.catalog.delete_collection(CollectionKind::Album, id)
    }

    pub fn albums(&self) -> Result<Vec<CollectionSummary>> {
        self.catalog.list_collections(CollectionKind::Album)
    }

    pub fn album(&self, id: i64) -> Result<Option<Album>> {
        self.catalog.get_album(id)
    }

    /// Photos of an album in display order, with content.
    pub fn album_photos(&self, album_id: i64) -> Result<Vec<Ordered<LoadedPhoto>>> {
        self.catalog
            .album_photos(album_id)?
            .into_iter()
            .map(|o| {
                Ok(Ordered {
                    item: load(o.item)?,
                    order_index: o.order_index,
                })
            })
            .collect()
    }

    pub fn album_cover(&self, album_id: i64) -> Result<Option<Photo>> {
        self.catalog.album_cover(album_id)
    }

    pub fn album_members(&self, album_id: i64) -> Result<Vec<(i64, i64)>> {
        self.catalog.members(&ALBUM_PHOTOS, album_id)
    }

    pub fn attach_to_album(&self, album_id: i64, photo_id: i64, order_index: i64) -> Result<()> {
        self.catalog
            .attach(&ALBUM_PHOTOS, album_id, photo_id, order_index)
    }

    pub fn append_to_album(&mut self, album_id: i64, photo_id: i64) -> Result<i64> {
        self.catalog.append(&ALBUM_PHOTOS, album_id, photo_id)
    }

    pub fn detach_from_album(&self, album_id: i64, photo_id: i64) -> Result<bool> {
        self.catalog.detach(&ALBUM_PHOTOS, album_id, photo_id)
    }

    pub fn reorder_album(&mut self, album_id: i64, photo_ids: &[i64]) -> Result<()> {
        self.reorder(CollectionKind::Album, album_id, photo_ids)
    }

    // ── Events ───────────────────────────────────────────────────────

    pub fn create_event(&self, name: &str) -> Result<i64> {
        self.catalog.create_collection(CollectionKind::Event, name)
    }

    pub fn rename_event(&self, id: i64, new_name: &str) -> Result<bool> {
        self.catalog
            .rename_collection(CollectionKind::Event, id, new_name)
    }

    pub fn delete_event(&self, id: i64) -> Result<bool> {
        self.catalog.delete_collection(CollectionKind::Event, id)
    }

    pub fn events(&self) -> Result<Vec<CollectionSummary>> {
        self.catalog.list_collections(CollectionKind::Event)
    }

    pub fn event(&self, id: i64) -> Result<Option<Event>> {
        self.catalog.get_event(id)
    }

    /// Albums of an event in display order, each with its cover photo.
    pub fn event_albums(&self, event_id: i64) -> Result<Vec<EventAlbum>> {
        self.catalog
            .event_albums(event_id)?
            .into_iter()
            .map(|o| {
                let cover = self.catalog.album_cover(o.item.id)?.map(load).transpose()?;
                Ok(EventAlbum {
                    album: o.item,
                    order_index: o.order_index,
                    cover,
                })
            })
            .collect()
    }

    pub fn event_cover(&self, event_id: i64) -> Result<Option<Album>> {
        self.catalog.event_cover(event_id)
    }

    pub fn event_members(&self, event_id: i64) -> Result<Vec<(i64, i64)>> {
        self.catalog.members(&EVENT_ALBUMS, event_id)
    }

    pub fn attach_to_event(&self, event_id: i64, album_id: i64, order_index: i64) -> Result<()> {
        self.catalog
            .attach(&EVENT_ALBUMS, event_id, album_id, order_index)
    }

    pub fn append_to_event(&mut self, event_id: i64, album_id: i64) -> Result<i64> {
        self.catalog.append(&EVENT_ALBUMS, event_id, album_id)
    }

    pub fn detach_from_event(&self, event_id: i64, album_id: i64) -> Result<bool> {
        self.catalog.detach(&EVENT_ALBUMS, event_id, album_id)
    }

    pub fn reorder_event(&mut self, event_id: i64, album_ids: &[i64]) -> Result<()> {
        self.reorder(CollectionKind::Event, event_id, album_ids)
    }

    fn reorder(&mut self, kind: CollectionKind, parent_id: i64, sequence: &[i64]) -> Result<()> {
        if !self.catalog.collection_exists(kind, parent_id)? {
            return Err(kind.not_found(parent_id));
        }
        self.catalog.reorder(kind.membership(), parent_id, sequence)
    }

    // ── Purchases ────────────────────────────────────────────────────

    pub fn create_purchase(&self, photo_ids: &[i64]) -> Result<i64> {
        self.catalog.create_purchase(photo_ids)
    }

    /// Returns false when `id` is unknown. Enforces the configured transition policy.
    pub fn set_purchase_status(&mut self, id: i64, status: PurchaseStatus) -> Result<bool> {
        self.catalog.set_purchase_status(id, status, self.policy)
    }

    pub fn purchases(&self) -> Result<Vec<Purchase>> {
        self.catalog.list_purchases()
    }

    pub fn purchase(&self, id: i64) -> Result<Option<Purchase>> {
        self.catalog.get_purchase(id)
    }

    /// Records of a purchase's photos that still exist, in selection order,
    /// each photo once.
    pub fn purchase_photo_records(&self, purchase_id: i64) -> Result<Vec<Photo>> {
        let purchase = self
            .catalog
            .get_purchase(purchase_id)?
            .ok_or(Error::PurchaseNotFound(purchase_id))?;
        self.catalog.photos_by_ids(&purchase.photo_ids)
    }

    /// Like [`Vault::purchase_photo_records`], with content attached.
    pub fn purchase_photos(&self, purchase_id: i64) -> Result<Vec<LoadedPhoto>> {
        self.purchase_photo_records(purchase_id)?
            .into_iter()
            .map(load)
            .collect()
    }
}

/// `photos/` next to the catalog file, as an absolute path.
/// The catalog's parent directory exists once the catalog is open.
fn default_storage_dir(catalog_path: &Path) -> Result<PathBuf> {
    let parent = match catalog_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(parent.canonicalize()?.join("photos"))
}

fn load(photo: Photo) -> Result<LoadedPhoto> {
    let data = storage::read_base64(&photo.path)?;
    Ok(LoadedPhoto { photo, data })
}
