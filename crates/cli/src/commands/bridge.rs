use std::io;
use std::path::PathBuf;

use anyhow::Result;
use photomanager_core::bridge::{Bridge, PresetPicker};
use photomanager_core::Vault;

pub fn run(vault: Vault, pick_dir: Option<PathBuf>) -> Result<()> {
    log::info!("bridge listening on stdin");
    let mut bridge = Bridge::new(vault, Box::new(PresetPicker(pick_dir)));
    let stdin = io::stdin();
    let stdout = io::stdout();
    bridge.serve(stdin.lock(), stdout.lock())?;
    bridge.into_vault().close()?;
    Ok(())
}
