use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::warn;

/// Name of the credential file shipped with a showcase.
pub const CREDENTIALS_FILE: &str = "credentials.txt";

/// Extension of emblem mesh files.
const MESH_EXTENSION: &str = ".obj";

/// Asset source for a showcase: a flat directory on disk, or an in-memory
/// set of named entries. Names are indexed once, sorted, and shared cheaply
/// across clones.
#[derive(Debug, Clone)]
pub struct ShowcaseAssets {
    backing: AssetBacking,
    names: Arc<[String]>,
}

#[derive(Debug, Clone)]
enum AssetBacking {
    Dir(PathBuf),
    Memory {
        _label: String,
        entries: Arc<BTreeMap<String, Vec<u8>>>,
    },
}

impl ShowcaseAssets {
    /// Opens a showcase directory and indexes its files.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dir = path.as_ref().to_path_buf();
        let metadata = fs::metadata(&dir)
            .with_context(|| format!("unable to open showcase {}", dir.display()))?;
        if !metadata.is_dir() {
            return Err(anyhow!("{} is not a directory", dir.display()));
        }
        let mut names = Vec::new();
        let listing = fs::read_dir(&dir)
            .with_context(|| format!("unable to list showcase {}", dir.display()))?;
        for entry in listing {
            let entry = entry.context("unable to read directory entry")?;
            let kind = entry
                .file_type()
                .with_context(|| format!("unable to inspect {:?}", entry.file_name()))?;
            if !kind.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => warn!("skipping asset with non-UTF-8 name: {raw:?}"),
            }
        }
        names.sort();
        Ok(Self {
            backing: AssetBacking::Dir(dir),
            names: names.into(),
        })
    }

    /// Builds an in-memory showcase. Tests and fixtures use this to avoid
    /// touching the filesystem.
    pub fn from_entries(label: impl Into<String>, entries: Vec<(String, Vec<u8>)>) -> Self {
        let entries: BTreeMap<String, Vec<u8>> = entries.into_iter().collect();
        let names: Vec<String> = entries.keys().cloned().collect();
        Self {
            backing: AssetBacking::Memory {
                _label: label.into(),
                entries: Arc::new(entries),
            },
            names: names.into(),
        }
    }

    /// Names of every indexed asset, sorted lexicographically.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|known| known == name)
    }

    /// The emblem mesh: the first `.obj` entry in name order, if any.
    pub fn emblem_mesh(&self) -> Option<&str> {
        self.names
            .iter()
            .find(|name| name.ends_with(MESH_EXTENSION))
            .map(String::as_str)
    }

    /// Reads an asset's raw bytes.
    pub fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
        if !self.contains(name) {
            return Err(anyhow!("asset not found in showcase: {name}"));
        }
        match &self.backing {
            AssetBacking::Dir(dir) => fs::read(dir.join(name))
                .with_context(|| format!("unable to read asset {name}")),
            AssetBacking::Memory { entries, .. } => entries
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("asset not found in showcase: {name}")),
        }
    }

    /// Reads an asset as UTF-8 text.
    pub fn read_text(&self, name: &str) -> Result<String> {
        let bytes = self.read_bytes(name)?;
        String::from_utf8(bytes).map_err(|err| anyhow!("{name} is not valid UTF-8: {err}"))
    }

    /// Size of one asset in bytes.
    pub fn size_of(&self, name: &str) -> Result<u64> {
        if !self.contains(name) {
            return Err(anyhow!("asset not found in showcase: {name}"));
        }
        match &self.backing {
            AssetBacking::Dir(dir) => {
                let metadata = fs::metadata(dir.join(name))
                    .with_context(|| format!("unable to stat asset {name}"))?;
                Ok(metadata.len())
            }
            AssetBacking::Memory { entries, .. } => entries
                .get(name)
                .map(|data| data.len() as u64)
                .ok_or_else(|| anyhow!("asset not found in showcase: {name}")),
        }
    }

    /// Contents of the credential file, if the showcase ships a readable
    /// one. Failures degrade to `None` so a broken file never takes the
    /// rest of the page down.
    pub fn credentials_text(&self) -> Option<String> {
        if !self.contains(CREDENTIALS_FILE) {
            return None;
        }
        match self.read_text(CREDENTIALS_FILE) {
            Ok(text) => Some(text),
            Err(err) => {
                warn!("unable to read {CREDENTIALS_FILE}: {err:?}");
                None
            }
        }
    }
}
