//! Ordered, deduplicated parent → member associations.
//!
//! The same engine backs album → photo and event → album lists. A member
//! appears in a parent at most once (composite primary key), and
//! `order_index` gives its display position within that parent.

use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension};

use super::Catalog;
use crate::error::{Error, Result};

/// Table layout of one parent → member relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub table: &'static str,
    pub parent_column: &'static str,
    pub member_column: &'static str,
}

pub const ALBUM_PHOTOS: Membership = Membership {
    table: "album_photos",
    parent_column: "album_id",
    member_column: "photo_id",
};

pub const EVENT_ALBUMS: Membership = Membership {
    table: "event_albums",
    parent_column: "event_id",
    member_column: "album_id",
};

impl Membership {
    fn attach_sql(&self) -> String {
        format!(
            "INSERT INTO {t} ({p}, {m}, order_index) VALUES (?1, ?2, ?3)
             ON CONFLICT({p}, {m}) DO UPDATE SET order_index = excluded.order_index",
            t = self.table,
            p = self.parent_column,
            m = self.member_column,
        )
    }
}

pub(crate) fn attach(
    conn: &Connection,
    rel: &Membership,
    parent_id: i64,
    member_id: i64,
    order_index: i64,
) -> Result<()> {
    conn.execute(&rel.attach_sql(), params![parent_id, member_id, order_index])?;
    Ok(())
}

pub(crate) fn list(conn: &Connection, rel: &Membership, parent_id: i64) -> Result<Vec<(i64, i64)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {m}, order_index FROM {t} WHERE {p} = ?1 ORDER BY order_index, {m}",
        t = rel.table,
        p = rel.parent_column,
        m = rel.member_column,
    ))?;
    let rows = stmt
        .query_map(params![parent_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Final member order for a reorder request: the requested members first, then
/// any members left out of the request in their previous relative order.
fn merged_order(parent_id: i64, current: &[(i64, i64)], requested: &[i64]) -> Result<Vec<i64>> {
    let members: HashSet<i64> = current.iter().map(|(m, _)| *m).collect();
    let mut seen = HashSet::with_capacity(requested.len());
    for &member in requested {
        if !members.contains(&member) {
            return Err(Error::NotAMember {
                parent: parent_id,
                member,
            });
        }
        if !seen.insert(member) {
            return Err(Error::DuplicateMember(member));
        }
    }

    let mut order = requested.to_vec();
    order.extend(
        current
            .iter()
            .map(|(m, _)| *m)
            .filter(|m| !seen.contains(m)),
    );
    Ok(order)
}

impl Catalog {
    /// Place `member_id` in `parent_id` at `order_index`, overwriting the index
    /// if the pair already exists.
    pub fn attach(&self, rel: &Membership, parent_id: i64, member_id: i64, order_index: i64) -> Result<()> {
        attach(&self.conn, rel, parent_id, member_id, order_index)?;
        log::debug!(
            "{}: attached {member_id} to {parent_id} at {order_index}",
            rel.table
        );
        Ok(())
    }

    /// Attach `member_id` after the current last member and return its index.
    /// A member that is already present keeps its position.
    pub fn append(&mut self, rel: &Membership, parent_id: i64, member_id: i64) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                &format!(
                    "SELECT order_index FROM {t} WHERE {p} = ?1 AND {m} = ?2",
                    t = rel.table,
                    p = rel.parent_column,
                    m = rel.member_column,
                ),
                params![parent_id, member_id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(index) = existing {
            return Ok(index);
        }

        let next: i64 = tx.query_row(
            &format!(
                "SELECT COALESCE(MAX(order_index) + 1, 0) FROM {t} WHERE {p} = ?1",
                t = rel.table,
                p = rel.parent_column,
            ),
            params![parent_id],
            |row| row.get(0),
        )?;
        attach(&tx, rel, parent_id, member_id, next)?;
        tx.commit()?;
        log::debug!("{}: appended {member_id} to {parent_id} at {next}", rel.table);
        Ok(next)
    }

    /// Remove a member from a parent. Returns false when the pair was absent.
    pub fn detach(&self, rel: &Membership, parent_id: i64, member_id: i64) -> Result<bool> {
        let removed = self.conn.execute(
            &format!(
                "DELETE FROM {t} WHERE {p} = ?1 AND {m} = ?2",
                t = rel.table,
                p = rel.parent_column,
                m = rel.member_column,
            ),
            params![parent_id, member_id],
        )?;
        Ok(removed > 0)
    }

    /// Members of a parent with their order index, ascending.
    pub fn members(&self, rel: &Membership, parent_id: i64) -> Result<Vec<(i64, i64)>> {
        list(&self.conn, rel, parent_id)
    }

    pub fn count_members(&self, rel: &Membership, parent_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {t} WHERE {p} = ?1",
                t = rel.table,
                p = rel.parent_column,
            ),
            params![parent_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Rewrite `order_index` so the members in `sequence` take positions
    /// 0, 1, 2, ... in that order. Members missing from `sequence` follow
    /// them in their previous relative order. All writes commit together.
    pub fn reorder(&mut self, rel: &Membership, parent_id: i64, sequence: &[i64]) -> Result<()> {
        let tx = self.conn.transaction()?;
        let current = list(&tx, rel, parent_id)?;
        let order = merged_order(parent_id, &current, sequence)?;

        for (position, member_id) in order.iter().enumerate() {
            attach(&tx, rel, parent_id, *member_id, position as i64)?;
        }
        tx.commit()?;
        log::debug!(
            "{}: reordered {} members of {parent_id}",
            rel.table,
            order.len()
        );
        Ok(())
    }
}
