use anyhow::{bail, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use photomanager_core::domain::CollectionSummary;
use photomanager_core::Vault;

use super::format_time;

/// Which collection a subcommand operates on.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    Album,
    Event,
}

impl Kind {
    fn label(self) -> &'static str {
        match self {
            Kind::Album => "album",
            Kind::Event => "event",
        }
    }

    fn member_label(self) -> &'static str {
        match self {
            Kind::Album => "photo",
            Kind::Event => "album",
        }
    }
}

pub fn create(vault: &mut Vault, kind: Kind, name: &str) -> Result<()> {
    let id = match kind {
        Kind::Album => vault.create_album(name)?,
        Kind::Event => vault.create_event(name)?,
    };
    println!("Created {} #{id}: {}", kind.label(), name.trim());
    Ok(())
}

pub fn list(vault: &mut Vault, kind: Kind) -> Result<()> {
    let summaries: Vec<CollectionSummary> = match kind {
        Kind::Album => vault.albums()?,
        Kind::Event => vault.events()?,
    };
    if summaries.is_empty() {
        println!("No {}s yet.", kind.label());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Name"),
        Cell::new(format!("{}s", capitalize(kind.member_label()))),
        Cell::new("Created"),
    ]);
    for summary in &summaries {
        let count = if summary.member_count == 0 {
            Cell::new(0).fg(Color::DarkGrey)
        } else {
            Cell::new(summary.member_count)
        };
        table.add_row(vec![
            Cell::new(summary.id).fg(Color::Cyan),
            Cell::new(&summary.name),
            count,
            Cell::new(format_time(summary.created_at)),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn show(vault: &mut Vault, kind: Kind, id: i64) -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    match kind {
        Kind::Album => {
            let Some(album) = vault.album(id)? else {
                bail!("no album #{id}");
            };
            println!("Album #{} {}", album.id, album.name);
            table.set_header(vec![Cell::new("#"), Cell::new("Photo"), Cell::new("Name")]);
            for (photo_id, order_index) in vault.album_members(id)? {
                let name = vault
                    .photo(photo_id)?
                    .map(|p| p.name)
                    .unwrap_or_else(|| "?".to_string());
                table.add_row(vec![
                    Cell::new(order_index).fg(Color::DarkGrey),
                    Cell::new(photo_id).fg(Color::Cyan),
                    Cell::new(name),
                ]);
            }
        }
        Kind::Event => {
            let Some(event) = vault.event(id)? else {
                bail!("no event #{id}");
            };
            println!("Event #{} {}", event.id, event.name);
            table.set_header(vec![
                Cell::new("#"),
                Cell::new("Album"),
                Cell::new("Name"),
                Cell::new("Cover"),
            ]);
            for (album_id, order_index) in vault.event_members(id)? {
                let name = vault
                    .album(album_id)?
                    .map(|a| a.name)
                    .unwrap_or_else(|| "?".to_string());
                let cover = match vault.album_cover(album_id)? {
                    Some(photo) => Cell::new(photo.name),
                    None => Cell::new("\u{2014}").fg(Color::DarkGrey),
                };
                table.add_row(vec![
                    Cell::new(order_index).fg(Color::DarkGrey),
                    Cell::new(album_id).fg(Color::Cyan),
                    Cell::new(name),
                    cover,
                ]);
            }
        }
    }
    println!("{table}");
    Ok(())
}

pub fn rename(vault: &mut Vault, kind: Kind, id: i64, name: &str) -> Result<()> {
    let renamed = match kind {
        Kind::Album => vault.rename_album(id, name)?,
        Kind::Event => vault.rename_event(id, name)?,
    };
    report(renamed, format!("Renamed {} #{id} to {}", kind.label(), name.trim()), kind, id);
    Ok(())
}

pub fn rm(vault: &mut Vault, kind: Kind, id: i64) -> Result<()> {
    let deleted = match kind {
        Kind::Album => vault.delete_album(id)?,
        Kind::Event => vault.delete_event(id)?,
    };
    report(deleted, format!("Deleted {} #{id}", kind.label()), kind, id);
    Ok(())
}

pub fn add(vault: &mut Vault, kind: Kind, id: i64, member: i64, at: Option<i64>) -> Result<()> {
    let order_index = match (kind, at) {
        (Kind::Album, Some(index)) => {
            vault.attach_to_album(id, member, index)?;
            index
        }
        (Kind::Album, None) => vault.append_to_album(id, member)?,
        (Kind::Event, Some(index)) => {
            vault.attach_to_event(id, member, index)?;
            index
        }
        (Kind::Event, None) => vault.append_to_event(id, member)?,
    };
    println!(
        "Added {} #{member} to {} #{id} at position {order_index}",
        kind.member_label(),
        kind.label()
    );
    Ok(())
}

pub fn remove(vault: &mut Vault, kind: Kind, id: i64, member: i64) -> Result<()> {
    let removed = match kind {
        Kind::Album => vault.detach_from_album(id, member)?,
        Kind::Event => vault.detach_from_event(id, member)?,
    };
    if removed {
        println!("Removed {} #{member} from {} #{id}", kind.member_label(), kind.label());
    } else {
        println!("{} #{member} is not in {} #{id}", capitalize(kind.member_label()), kind.label());
    }
    Ok(())
}

pub fn reorder(vault: &mut Vault, kind: Kind, id: i64, members: &[i64]) -> Result<()> {
    match kind {
        Kind::Album => vault.reorder_album(id, members)?,
        Kind::Event => vault.reorder_event(id, members)?,
    }
    println!("Reordered {} #{id}", kind.label());
    Ok(())
}

fn report(done: bool, message: String, kind: Kind, id: i64) {
    if done {
        println!("{message}");
    } else {
        println!("No {} #{id}", kind.label());
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
