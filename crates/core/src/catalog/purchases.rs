use rusqlite::{params, OptionalExtension, Row};

use super::{now, Catalog};
use crate::domain::{Purchase, PurchaseStatus, TransitionPolicy};
use crate::error::{Error, Result};

fn purchase_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode((id, photo_ids, status, created_at): (i64, String, String, i64)) -> Result<Purchase> {
    Ok(Purchase {
        id,
        photo_ids: serde_json::from_str(&photo_ids)?,
        status: status.parse()?,
        created_at,
    })
}

impl Catalog {
    /// Record a selection of photo ids as given. No dedup, no existence check.
    pub fn create_purchase(&self, photo_ids: &[i64]) -> Result<i64> {
        let encoded = serde_json::to_string(photo_ids)?;
        self.conn.execute(
            "INSERT INTO purchases (photo_ids, status, created_at) VALUES (?1, ?2, ?3)",
            params![encoded, PurchaseStatus::Pending.as_str(), now()],
        )?;
        let id = self.conn.last_insert_rowid();
        log::info!("created purchase {id} with {} photos", photo_ids.len());
        Ok(id)
    }

    pub fn get_purchase(&self, id: i64) -> Result<Option<Purchase>> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, photo_ids, status, created_at FROM purchases WHERE id = ?1",
                params![id],
                purchase_from_row,
            )
            .optional()?;
        raw.map(decode).transpose()
    }

    /// All purchases, newest first.
    pub fn list_purchases(&self) -> Result<Vec<Purchase>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, photo_ids, status, created_at FROM purchases
             ORDER BY created_at DESC, id DESC",
        )?;
        let raw = stmt
            .query_map([], purchase_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        raw.into_iter().map(decode).collect()
    }

    /// Change a purchase's status. Returns false when `id` is unknown.
    /// Under [`TransitionPolicy::Strict`] edges outside the lifecycle table fail.
    pub fn set_purchase_status(
        &mut self,
        id: i64,
        status: PurchaseStatus,
        policy: TransitionPolicy,
    ) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let current: Option<String> = tx
            .query_row(
                "SELECT status FROM purchases WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current else {
            return Ok(false);
        };

        if policy == TransitionPolicy::Strict {
            let from: PurchaseStatus = current.parse()?;
            if !from.can_transition_to(status) {
                return Err(Error::IllegalTransition { from, to: status });
            }
        }

        let changed = tx.execute(
            "UPDATE purchases SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        tx.commit()?;
        log::info!("purchase {id}: {current} -> {status}");
        Ok(changed > 0)
    }
}
