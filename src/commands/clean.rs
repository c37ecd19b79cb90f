//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::Spacetraveling;

/// Remove the generated site
pub fn run(app: &Spacetraveling) -> Result<()> {
    if app.public_dir.exists() {
        fs::remove_dir_all(&app.public_dir)?;
        tracing::info!("Deleted: {:?}", app.public_dir);
    }

    Ok(())
}
