use std::io::Write;
use std::path::Path;

use anyhow::{Result, bail};

use super::load_catalog;

/// Print a compliant declaration for each requested specification.
pub(crate) fn run(config: Option<&Path>, names: &[String], out: &mut impl Write) -> Result<()> {
    let catalog = load_catalog(config, Path::new("."))?;

    for name in names {
        if catalog.matching(name).next().is_none() {
            bail!("no specification named {name:?} in the catalog");
        }
    }

    let stubs: Vec<String> = catalog
        .iter()
        .filter(|spec| names.is_empty() || names.iter().any(|n| n == spec.name()))
        .map(|spec| spec.render_stub())
        .collect();
    write!(out, "{}", stubs.join("\n"))?;
    Ok(())
}
