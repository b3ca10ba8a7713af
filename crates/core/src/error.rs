use std::path::PathBuf;

use rusqlite::ffi;

use crate::domain::PurchaseStatus;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("photo not found: {0}")]
    PhotoNotFound(i64),

    #[error("album not found: {0}")]
    AlbumNotFound(i64),

    #[error("event not found: {0}")]
    EventNotFound(i64),

    #[error("purchase not found: {0}")]
    PurchaseNotFound(i64),

    #[error("directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{kind} named {name:?} already exists")]
    UniqueViolation { kind: &'static str, name: String },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("{member} is not a member of {parent}")]
    NotAMember { parent: i64, member: i64 },

    #[error("member {0} appears more than once in the new order")]
    DuplicateMember(i64),

    #[error("name must not be empty")]
    InvalidName,

    #[error("unknown purchase status: {0:?}")]
    InvalidStatus(String),

    #[error("purchase cannot move from {from} to {to}")]
    IllegalTransition {
        from: PurchaseStatus,
        to: PurchaseStatus,
    },

    #[error("catalog schema version {db} is newer than this build supports ({code})")]
    SchemaTooNew { db: u32, code: u32 },
}

impl Error {
    /// Stable snake_case label, used in bridge error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Database(_) => "database",
            Error::Io(_) | Error::Unreadable { .. } | Error::WalkDir(_) => "io_failure",
            Error::Json(_) => "json",
            Error::PhotoNotFound(_)
            | Error::AlbumNotFound(_)
            | Error::EventNotFound(_)
            | Error::PurchaseNotFound(_)
            | Error::DirectoryNotFound(_) => "not_found",
            Error::NotADirectory(_) => "not_a_directory",
            Error::UniqueViolation { .. } => "unique_constraint_violation",
            Error::ConstraintViolation(_) => "constraint_violation",
            Error::NotAMember { .. } | Error::DuplicateMember(_) => "invalid_order",
            Error::InvalidName => "invalid_name",
            Error::InvalidStatus(_) => "invalid_status",
            Error::IllegalTransition { .. } => "illegal_transition",
            Error::SchemaTooNew { .. } => "schema_too_new",
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::ConstraintViolation(
                    msg.clone()
                        .unwrap_or_else(|| "FOREIGN KEY constraint failed".to_string()),
                )
            }
            _ => Error::Database(err),
        }
    }
}

/// Map a rusqlite error from a named insert/update into `UniqueViolation`
/// when it was caused by a UNIQUE constraint.
pub(crate) fn unique_or(kind: &'static str, name: &str, err: rusqlite::Error) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::UniqueViolation {
                kind,
                name: name.to_string(),
            }
        }
        _ => Error::from(err),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
