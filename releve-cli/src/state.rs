use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$RELEVE_HOME`, or `~/.releve` when unset.
pub fn releve_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("RELEVE_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".releve"))
}

pub fn ensure_releve_home() -> Result<PathBuf> {
    let dir = releve_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
