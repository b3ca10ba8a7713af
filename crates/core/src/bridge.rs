//! Command/response surface for front ends.
//!
//! Each [`Command`] maps to one vault operation. [`Bridge::serve`] speaks
//! newline-delimited JSON: one command object per input line, one envelope
//! per output line, either `{"ok":true,"result":...}` or
//! `{"ok":false,"error":{"kind":...,"message":...}}`.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::*;
use crate::error::Result;
use crate::Vault;

/// Source of a user-chosen directory, e.g. a native folder dialog.
pub trait DirectoryPicker {
    /// `None` means the user cancelled.
    fn pick_directory(&self) -> Option<PathBuf>;
}

/// Picker that always answers with a fixed choice.
#[derive(Debug, Clone, Default)]
pub struct PresetPicker(pub Option<PathBuf>);

impl DirectoryPicker for PresetPicker {
    fn pick_directory(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    PickDirectory,
    ListImageFiles { dir: PathBuf },
    ReadFileBase64 { path: PathBuf },
    ImportDirectory { dir: PathBuf },

    AddPhoto { name: String, source: PathBuf },
    ListPhotos,
    DeletePhoto { id: i64 },

    CreateAlbum { name: String },
    ListAlbums,
    ListAlbumPhotos { album_id: i64 },
    AttachToAlbum { album_id: i64, photo_id: i64, order_index: i64 },
    AppendToAlbum { album_id: i64, photo_id: i64 },
    DetachFromAlbum { album_id: i64, photo_id: i64 },
    ReorderAlbum { album_id: i64, photo_ids: Vec<i64> },
    RenameAlbum { id: i64, name: String },
    DeleteAlbum { id: i64 },

    CreateEvent { name: String },
    ListEvents,
    ListEventAlbums { event_id: i64 },
    AttachToEvent { event_id: i64, album_id: i64, order_index: i64 },
    AppendToEvent { event_id: i64, album_id: i64 },
    DetachFromEvent { event_id: i64, album_id: i64 },
    ReorderEvent { event_id: i64, album_ids: Vec<i64> },
    RenameEvent { id: i64, name: String },
    DeleteEvent { id: i64 },

    CreatePurchase { photo_ids: Vec<i64> },
    SetPurchaseStatus { id: i64, status: String },
    ListPurchases,
    PurchasePhotos { id: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Response {
    Directory(Option<PathBuf>),
    FileNames(Vec<String>),
    Base64(String),
    Id(i64),
    Done(bool),
    OrderIndex(i64),
    Photos(Vec<LoadedPhoto>),
    Collections(Vec<CollectionSummary>),
    AlbumPhotos(Vec<Ordered<LoadedPhoto>>),
    EventAlbums(Vec<EventAlbum>),
    Purchases(Vec<Purchase>),
    Import(ImportReport),
}

pub struct Bridge {
    vault: Vault,
    picker: Box<dyn DirectoryPicker>,
}

impl Bridge {
    pub fn new(vault: Vault, picker: Box<dyn DirectoryPicker>) -> Self {
        Self { vault, picker }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn into_vault(self) -> Vault {
        self.vault
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Response> {
        let vault = &mut self.vault;
        let response = match command {
            Command::PickDirectory => Response::Directory(self.picker.pick_directory()),
            Command::ListImageFiles { dir } => Response::FileNames(vault.list_image_files(&dir)?),
            Command::ReadFileBase64 { path } => Response::Base64(vault.read_file_base64(&path)?),
            Command::ImportDirectory { dir } => Response::Import(vault.import_directory(&dir, None)?),

            Command::AddPhoto { name, source } => Response::Id(vault.add_photo(&name, &source)?),
            Command::ListPhotos => Response::Photos(vault.photos()?),
            Command::DeletePhoto { id } => Response::Done(vault.delete_photo(id)?),

            Command::CreateAlbum { name } => Response::Id(vault.create_album(&name)?),
            Command::ListAlbums => Response::Collections(vault.albums()?),
            Command::ListAlbumPhotos { album_id } => {
                Response::AlbumPhotos(vault.album_photos(album_id)?)
            }
            Command::AttachToAlbum {
                album_id,
                photo_id,
                order_index,
            } => {
                vault.attach_to_album(album_id, photo_id, order_index)?;
                Response::Done(true)
            }
            Command::AppendToAlbum { album_id, photo_id } => {
                Response::OrderIndex(vault.append_to_album(album_id, photo_id)?)
            }
            Command::DetachFromAlbum { album_id, photo_id } => {
                Response::Done(vault.detach_from_album(album_id, photo_id)?)
            }
            Command::ReorderAlbum {
                album_id,
                photo_ids,
            } => {
                vault.reorder_album(album_id, &photo_ids)?;
                Response::Done(true)
            }
            Command::RenameAlbum { id, name } => Response::Done(vault.rename_album(id, &name)?),
            Command::DeleteAlbum { id } => Response::Done(vault.delete_album(id)?),

            Command::CreateEvent { name } => Response::Id(vault.create_event(&name)?),
            Command::ListEvents => Response::Collections(vault.events()?),
            Command::ListEventAlbums { event_id } => {
                Response::EventAlbums(vault.event_albums(event_id)?)
            }
            Command::AttachToEvent {
                event_id,
                album_id,
                order_index,
            } => {
                vault.attach_to_event(event_id, album_id, order_index)?;
                Response::Done(true)
            }
            Command::AppendToEvent { event_id, album_id } => {
                Response::OrderIndex(vault.append_to_event(event_id, album_id)?)
            }
            Command::DetachFromEvent { event_id, album_id } => {
                Response::Done(vault.detach_from_event(event_id, album_id)?)
            }
            Command::ReorderEvent {
                event_id,
                album_ids,
            } => {
                vault.reorder_event(event_id, &album_ids)?;
                Response::Done(true)
            }
            Command::RenameEvent { id, name } => Response::Done(vault.rename_event(id, &name)?),
            Command::DeleteEvent { id } => Response::Done(vault.delete_event(id)?),

            Command::CreatePurchase { photo_ids } => {
                Response::Id(vault.create_purchase(&photo_ids)?)
            }
            Command::SetPurchaseStatus { id, status } => {
                let status: PurchaseStatus = status.parse()?;
                Response::Done(vault.set_purchase_status(id, status)?)
            }
            Command::ListPurchases => Response::Purchases(vault.purchases()?),
            Command::PurchasePhotos { id } => Response::Photos(vault.purchase_photos(id)?),
        };
        Ok(response)
    }

    /// Handle one JSON command line and produce its JSON envelope.
    pub fn handle_line(&mut self, line: &str) -> Value {
        let command: Command = match serde_json::from_str(line) {
            Ok(command) => command,
            Err(err) => return error_envelope("bad_request", &err.to_string()),
        };
        log::debug!("bridge: {command:?}");
        match self.dispatch(command) {
            Ok(response) => match serde_json::to_value(&response) {
                Ok(result) => json!({ "ok": true, "result": result }),
                Err(err) => error_envelope("json", &err.to_string()),
            },
            Err(err) => error_envelope(err.kind(), &err.to_string()),
        }
    }

    /// Serve newline-delimited commands until `input` is exhausted. Blank lines are skipped.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> std::io::Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let envelope = self.handle_line(&line);
            writeln!(output, "{envelope}")?;
            output.flush()?;
        }
        Ok(())
    }
}

fn error_envelope(kind: &str, message: &str) -> Value {
    json!({ "ok": false, "error": { "kind": kind, "message": message } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::Error;
    use crate::storage::PhotoStorage;
    use std::fs;

    fn bridge(pick: Option<PathBuf>) -> (Bridge, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let storage = PhotoStorage::new(&tmp.path().join("store")).unwrap();
        let vault = Vault::new(Catalog::open_in_memory().unwrap(), storage).unwrap();
        (Bridge::new(vault, Box::new(PresetPicker(pick))), tmp)
    }

    #[test]
    fn test_command_wire_format() {
        let cmd: Command =
            serde_json::from_str(r#"{"op":"attach_to_album","album_id":1,"photo_id":5,"order_index":0}"#)
                .unwrap();
        assert_eq!(
            cmd,
            Command::AttachToAlbum {
                album_id: 1,
                photo_id: 5,
                order_index: 0
            }
        );

        let cmd: Command = serde_json::from_str(r#"{"op":"list_photos"}"#).unwrap();
        assert_eq!(cmd, Command::ListPhotos);
    }

    #[test]
    fn test_pick_directory_cancelled() {
        let (mut bridge, _tmp) = bridge(None);
        let response = bridge.dispatch(Command::PickDirectory).unwrap();
        assert_eq!(response, Response::Directory(None));
    }

    #[test]
    fn test_album_round_trip_through_lines() {
        let (mut bridge, tmp) = bridge(None);
        let source = tmp.path().join("a.jpg");
        fs::write(&source, b"jpeg bytes").unwrap();

        let add = bridge.handle_line(&format!(
            r#"{{"op":"add_photo","name":"a.jpg","source":{}}}"#,
            serde_json::to_string(&source).unwrap()
        ));
        assert_eq!(add["ok"], true);
        let photo_id = add["result"]["value"].as_i64().unwrap();

        let album = bridge.handle_line(r#"{"op":"create_album","name":"Wedding"}"#);
        let album_id = album["result"]["value"].as_i64().unwrap();

        let append = bridge.handle_line(&format!(
            r#"{{"op":"append_to_album","album_id":{album_id},"photo_id":{photo_id}}}"#
        ));
        assert_eq!(append["result"], json!({ "type": "order_index", "value": 0 }));

        let listed = bridge.handle_line(&format!(
            r#"{{"op":"list_album_photos","album_id":{album_id}}}"#
        ));
        let photos = listed["result"]["value"].as_array().unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0]["id"], photo_id);
        assert_eq!(photos[0]["order_index"], 0);
        assert_eq!(photos[0]["data"], "anBlZyBieXRlcw==");
    }

    #[test]
    fn test_duplicate_album_reports_kind() {
        let (mut bridge, _tmp) = bridge(None);
        bridge.handle_line(r#"{"op":"create_album","name":"X"}"#);
        let second = bridge.handle_line(r#"{"op":"create_album","name":"X"}"#);
        assert_eq!(second["ok"], false);
        assert_eq!(second["error"]["kind"], "unique_constraint_violation");
    }

    #[test]
    fn test_invalid_status_rejected() {
        let (mut bridge, _tmp) = bridge(None);
        let id = match bridge
            .dispatch(Command::CreatePurchase { photo_ids: vec![5, 7] })
            .unwrap()
        {
            Response::Id(id) => id,
            other => panic!("unexpected {other:?}"),
        };
        let err = bridge
            .dispatch(Command::SetPurchaseStatus {
                id,
                status: "shipped".into(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStatus(_)));
    }

    #[test]
    fn test_malformed_line_is_bad_request() {
        let (mut bridge, _tmp) = bridge(None);
        let envelope = bridge.handle_line(r#"{"op":"launch_rockets"}"#);
        assert_eq!(envelope["ok"], false);
        assert_eq!(envelope["error"]["kind"], "bad_request");
    }

    #[test]
    fn test_serve_answers_each_line() {
        let (mut bridge, _tmp) = bridge(Some(PathBuf::from("/photos/in")));
        let input = "{\"op\":\"pick_directory\"}\n\n{\"op\":\"list_purchases\"}\n";
        let mut output = Vec::new();
        bridge.serve(input.as_bytes(), &mut output).unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["result"]["value"], "/photos/in");
        assert_eq!(lines[1]["result"], json!({ "type": "purchases", "value": [] }));
    }
}
