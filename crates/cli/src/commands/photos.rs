use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use photomanager_core::{ImportProgress, Vault};

use super::format_time;

fn active_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "  {bar:30.cyan/blue} {spinner:.green} {pos:>5}/{len:<5} {prefix:.dim} {msg}",
    )
    .unwrap()
    .progress_chars("━╸─")
}

fn done_style() -> ProgressStyle {
    ProgressStyle::with_template("  {bar:30.green} {prefix:.green} {msg:.dim}").unwrap()
}

pub fn import(vault: &Vault, dir: PathBuf) -> Result<()> {
    let pb = ProgressBar::hidden();
    let mut failures: Vec<(String, String)> = Vec::new();

    let report = vault.import_directory(
        &dir,
        Some(&mut |progress| match progress {
            ImportProgress::Start { total } => {
                println!("  Importing {} ({} files)", dir.display(), total);
                pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                pb.set_length(total as u64);
                pb.set_style(active_style());
                pb.set_prefix("Importing");
                pb.enable_steady_tick(std::time::Duration::from_millis(80));
            }
            ImportProgress::Imported { name } | ImportProgress::Skipped { name } => {
                pb.set_message(name);
                pb.inc(1);
            }
            ImportProgress::Failed { name, reason } => {
                pb.inc(1);
                failures.push((name, reason));
            }
            ImportProgress::Complete {
                imported,
                skipped,
                failed,
            } => {
                pb.set_style(done_style());
                pb.set_prefix("done");
                pb.finish_with_message(format!(
                    "{imported} imported, {skipped} already catalogued, {failed} failed"
                ));
            }
        }),
    )?;

    for (name, reason) in &failures {
        eprintln!("  failed: {name}: {reason}");
    }
    if report.imported == 0 && report.skipped == 0 && report.failed.is_empty() {
        println!("  No image files found.");
    }
    Ok(())
}

pub fn add(vault: &Vault, path: PathBuf, name: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .context("path has no file name; pass --name")?,
    };
    let id = vault.add_photo(&name, &path)?;
    println!("Added photo #{id}: {name}");
    Ok(())
}

pub fn list(vault: &Vault) -> Result<()> {
    let photos = vault.photo_records()?;
    if photos.is_empty() {
        println!("No photos yet. Run `photomgr photos import <dir>` first.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Name"),
        Cell::new("Added"),
        Cell::new("SHA-256"),
        Cell::new("Stored At"),
    ]);
    for photo in &photos {
        table.add_row(vec![
            Cell::new(photo.id).fg(Color::Cyan),
            Cell::new(&photo.name),
            Cell::new(format_time(photo.created_at)),
            Cell::new(&photo.sha256[..12.min(photo.sha256.len())]).fg(Color::DarkGrey),
            Cell::new(photo.path.display()),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn rm(vault: &Vault, id: i64) -> Result<()> {
    if vault.delete_photo(id)? {
        println!("Deleted photo #{id}");
    } else {
        println!("No photo #{id}");
    }
    Ok(())
}
