//! Subcommand implementations.

pub(crate) mod check;
pub(crate) mod stub;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use varlint_kernel::Catalog;

/// Catalog file looked for in the checked directory when none is given.
pub(crate) const DEFAULT_CATALOG: &str = ".varlint.toml";

/// `--config` (or `VARLINT_CONFIG`) if given, else `.varlint.toml` in `dir`.
pub(crate) fn catalog_path(config: Option<&Path>, dir: &Path) -> PathBuf {
    match config {
        Some(path) => path.to_path_buf(),
        None => dir.join(DEFAULT_CATALOG),
    }
}

pub(crate) fn load_catalog(config: Option<&Path>, dir: &Path) -> Result<Catalog> {
    let path = catalog_path(config, dir);
    debug!(path = %path.display(), "loading catalog");
    Catalog::load(&path).with_context(|| format!("failed to load catalog {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_wins() {
        let path = catalog_path(Some(Path::new("/etc/varlint.toml")), Path::new("infra"));
        assert_eq!(path, PathBuf::from("/etc/varlint.toml"));
    }

    #[test]
    fn falls_back_to_directory_catalog() {
        let path = catalog_path(None, Path::new("infra"));
        assert_eq!(path, Path::new("infra").join(".varlint.toml"));
    }

    #[test]
    fn loads_catalog_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CATALOG),
            "[[variable]]\nname = \"kind\"\ntype = \"string\"\n",
        )
        .unwrap();
        let catalog = load_catalog(None, dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn missing_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_catalog(None, dir.path()).unwrap_err();
        assert!(err.to_string().contains("failed to load catalog"));
    }
}
