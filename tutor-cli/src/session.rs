//! Local session file
//!
//! The assistant used by the labs is created out of band; its id is kept in
//! a single-line file next to the project.

use std::path::Path;

use anyhow::{Context, Result, bail};

/// Reads the assistant id, treating a missing or empty file as absent
pub fn read_assistant_id(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file {}", path.display()))?;
    let id = contents.trim();

    Ok((!id.is_empty()).then(|| id.to_string()))
}

/// Reads the assistant id, failing if there is none
pub fn load_assistant_id(path: &Path) -> Result<String> {
    match read_assistant_id(path)? {
        Some(id) => Ok(id),
        None if path.exists() => bail!("Session file {} is empty", path.display()),
        None => bail!(
            "No assistant file found at {}. Create the assistant first and store its id there.",
            path.display()
        ),
    }
}

/// Removes the session file after its assistant was deleted
pub fn forget_assistant(path: &Path) -> Result<()> {
    std::fs::remove_file(path)
        .with_context(|| format!("Failed to remove session file {}", path.display()))
}
