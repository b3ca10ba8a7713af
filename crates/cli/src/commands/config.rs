use anyhow::{anyhow, Result};
use photomanager_core::domain::TransitionPolicy;
use photomanager_core::Vault;

pub fn show(vault: &Vault) -> Result<()> {
    let stats = vault.status()?;
    println!("Storage:         {}", vault.storage_path().display());
    println!("Status policy:   {}", vault.transition_policy().as_str());
    println!();
    println!("Photos:          {}", stats.total_photos);
    println!("Albums:          {}", stats.total_albums);
    println!("Events:          {}", stats.total_events);
    println!("Purchases:       {}", stats.total_purchases);
    Ok(())
}

pub fn set_policy(vault: &mut Vault, policy: &str) -> Result<()> {
    let policy: TransitionPolicy = policy.parse().map_err(|err: String| anyhow!(err))?;
    vault.set_transition_policy(policy)?;
    println!("Status policy set to {}", policy.as_str());
    Ok(())
}
