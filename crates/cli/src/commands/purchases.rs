use std::collections::HashSet;

use anyhow::{bail, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use photomanager_core::domain::PurchaseStatus;
use photomanager_core::Vault;

use super::format_time;

fn status_cell(status: PurchaseStatus) -> Cell {
    let cell = Cell::new(status);
    match status {
        PurchaseStatus::Pending => cell.fg(Color::Yellow),
        PurchaseStatus::Processing => cell.fg(Color::Cyan),
        PurchaseStatus::Completed => cell.fg(Color::Green),
        PurchaseStatus::Cancelled => cell.fg(Color::DarkGrey),
    }
}

pub fn create(vault: &Vault, photo_ids: &[i64]) -> Result<()> {
    let id = vault.create_purchase(photo_ids)?;
    println!("Created purchase #{id} ({} photos, pending)", photo_ids.len());
    Ok(())
}

pub fn list(vault: &Vault) -> Result<()> {
    let purchases = vault.purchases()?;
    if purchases.is_empty() {
        println!("No purchases yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Status"),
        Cell::new("Photos"),
        Cell::new("Created"),
    ]);
    for purchase in &purchases {
        let ids: Vec<String> = purchase.photo_ids.iter().map(|id| id.to_string()).collect();
        table.add_row(vec![
            Cell::new(purchase.id).fg(Color::Cyan),
            status_cell(purchase.status),
            Cell::new(ids.join(", ")),
            Cell::new(format_time(purchase.created_at)),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn show(vault: &Vault, id: i64) -> Result<()> {
    let Some(purchase) = vault.purchase(id)? else {
        bail!("no purchase #{id}");
    };
    println!(
        "Purchase #{} ({}, {})",
        purchase.id,
        purchase.status,
        format_time(purchase.created_at)
    );
    println!("{}", "-".repeat(60));

    let photos = vault.purchase_photo_records(id)?;
    for photo in &photos {
        println!("  #{:<6} {}", photo.id, photo.name);
    }
    let distinct: HashSet<i64> = purchase.photo_ids.iter().copied().collect();
    let missing = distinct.len() - photos.len();
    if missing > 0 {
        println!("  ({missing} photos no longer in the catalog)");
    }
    Ok(())
}

pub fn status(vault: &mut Vault, id: i64, status: &str) -> Result<()> {
    let status: PurchaseStatus = status.parse()?;
    if vault.set_purchase_status(id, status)? {
        println!("Purchase #{id} is now {status}");
    } else {
        println!("No purchase #{id}");
    }
    Ok(())
}
