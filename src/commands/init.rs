use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory and its subdirectories:
/// - Writes an initial `config.json` with default settings.
/// - Writes a sample `config/budgets.json` for the user to edit.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(mintpipe_home: &Path) -> Result<Out<()>> {
    let config = Config::create(mintpipe_home)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the mintpipe directory at '{}'. Edit '{}' so that every \
         category your provider knows about appears in exactly one budget group.",
        config.root().display(),
        config.budgets_path().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_creates_the_home_directory() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("mintpipe");
        let out = init(&home).await.unwrap();
        assert!(out.message().contains("Successfully created"));
        assert!(home.join("config.json").is_file());
        assert!(home.join("config").join("budgets.json").is_file());
        assert!(home.join("cache").is_dir());
    }
}
