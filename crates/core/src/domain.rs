use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A catalogued photograph. `path` points into the managed storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub name: String,
    pub path: PathBuf,
    pub sha256: String,
    pub created_at: i64,
}

/// A photo with its file content attached, base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedPhoto {
    #[serde(flatten)]
    pub photo: Photo,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
}

/// An album or event as listed, with its derived member count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    pub member_count: usize,
}

/// A member of an ordered collection together with its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordered<T> {
    #[serde(flatten)]
    pub item: T,
    pub order_index: i64,
}

/// An album inside an event, with the album's cover photo if it has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAlbum {
    #[serde(flatten)]
    pub album: Album,
    pub order_index: i64,
    pub cover: Option<LoadedPhoto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl PurchaseStatus {
    pub const ALL: [PurchaseStatus; 4] = [
        PurchaseStatus::Pending,
        PurchaseStatus::Processing,
        PurchaseStatus::Completed,
        PurchaseStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Processing => "processing",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchaseStatus::Completed | PurchaseStatus::Cancelled)
    }

    /// Edges of the purchase lifecycle. Re-setting the current status is always allowed.
    pub fn can_transition_to(&self, next: PurchaseStatus) -> bool {
        use PurchaseStatus::*;
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Completed)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Cancelled)
        )
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PurchaseStatus::Pending),
            "processing" => Ok(PurchaseStatus::Processing),
            "completed" => Ok(PurchaseStatus::Completed),
            "cancelled" => Ok(PurchaseStatus::Cancelled),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Whether the ledger enforces the status transition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Any status may follow any other.
    #[default]
    Permissive,
    /// Only edges accepted by [`PurchaseStatus::can_transition_to`].
    Strict,
}

impl TransitionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPolicy::Permissive => "permissive",
            TransitionPolicy::Strict => "strict",
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(format!("unknown transition policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    pub photo_ids: Vec<i64>,
    pub status: PurchaseStatus,
    pub created_at: i64,
}

/// Outcome of importing a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub failed: Vec<ImportFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    pub name: String,
    pub reason: String,
}

/// Catalog summary statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_photos: usize,
    pub total_albums: usize,
    pub total_events: usize,
    pub total_purchases: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("Completed".parse::<PurchaseStatus>().unwrap(), PurchaseStatus::Completed);
        assert_eq!(" pending ".parse::<PurchaseStatus>().unwrap(), PurchaseStatus::Pending);
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        let err = "shipped".parse::<PurchaseStatus>().unwrap_err();
        assert!(matches!(err, Error::InvalidStatus(s) if s == "shipped"));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [PurchaseStatus::Completed, PurchaseStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in PurchaseStatus::ALL {
                assert_eq!(from.can_transition_to(to), from == to, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_cancel_reachable_from_open_states() {
        assert!(PurchaseStatus::Pending.can_transition_to(PurchaseStatus::Cancelled));
        assert!(PurchaseStatus::Processing.can_transition_to(PurchaseStatus::Cancelled));
        assert!(!PurchaseStatus::Processing.can_transition_to(PurchaseStatus::Pending));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&PurchaseStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    #[test]
    fn test_loaded_photo_flattens() {
        let loaded = LoadedPhoto {
            photo: Photo {
                id: 3,
                name: "a.jpg".into(),
                path: PathBuf::from("/store/abc.jpg"),
                sha256: "abc".into(),
                created_at: 10,
            },
            data: "AAAA".into(),
        };
        let value = serde_json::to_value(&loaded).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["data"], "AAAA");
    }
}
