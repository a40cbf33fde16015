use std::path::Path;

use color_eyre::eyre::{bail, Result};

use locsync_config::STARTER_CONFIG;

pub fn run(root: &Path, force: bool) -> Result<()> {
    let path = root.join("locsync.toml");
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(&path, STARTER_CONFIG)?;
    println!("✔ wrote {}", path.display());
    Ok(())
}
