//! `stockroom remote ...`: manage the remote section of the client config.

use std::path::Path;

use anyhow::Result;

use crate::config::ClientConfig;

pub fn set_remote(server: Option<&str>, token: Option<&str>, config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(config_path)?;
    if let Some(server) = server {
        config.remote.server = server.to_string();
    }
    if let Some(token) = token {
        config.remote.token = token.to_string();
    }
    config.save(config_path)?;
    println!("Remote updated in {}.", config_path.display());
    Ok(())
}

pub fn show(config_path: &Path, db_override: Option<&Path>) -> Result<()> {
    let config = ClientConfig::load(config_path)?;
    let server: &str = if config.remote.server.is_empty() {
        "-"
    } else {
        &config.remote.server
    };
    println!("Config:    {}", config_path.display());
    println!("Database:  {}", config.resolve_db_path(db_override).display());
    println!("Floor:     {}", config.store.offline_floor);
    println!("Server:    {}", server);
    println!("Token:     {}", if config.remote.token.is_empty() { "-" } else { "(set)" });
    Ok(())
}
