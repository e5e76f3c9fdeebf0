//! JSON export of a [`Topology`], through [`TopologyDocument`].

use anyhow::{Context as _, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write as _},
    path::Path,
};
use tracing::info;
use tsnsynth_core::{Topology, TopologyDocument};

pub fn to_json_string(topology: &Topology) -> Result<String> {
    Ok(serde_json::to_string_pretty(&TopologyDocument::from(topology))?)
}

/// Write `topology` as pretty printed JSON, creating the missing parent
/// directories of `path`.
pub fn to_json(topology: &Topology, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &TopologyDocument::from(topology))?;
    writer.flush()?;

    info!(path = %path.display(), "topology exported");
    Ok(())
}
