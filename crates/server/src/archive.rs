//! In-memory index over the zip archive embedded at build time. Loaded once
//! at startup; nothing is ever extracted to disk.

use std::{
    collections::HashMap,
    io::{Cursor, Read as _},
};

use crate::error::Result;

static ARCHIVE_BYTES: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/assets.zip"));

pub struct AssetIndex {
    entries: HashMap<String, Vec<u8>>,
}

impl AssetIndex {
    pub fn load() -> Result<Self> {
        Self::from_bytes(ARCHIVE_BYTES)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = HashMap::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut buf = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
            file.read_to_end(&mut buf)?;
            entries.insert(file.name().to_string(), buf);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_the_embedded_bundle_and_finds_index_html() {
        let index = AssetIndex::load().unwrap();
        assert!(!index.is_empty());
        assert!(index.get("index.html").is_some());
    }

    #[test]
    fn unknown_path_is_not_found() {
        let index = AssetIndex::load().unwrap();
        assert!(index.get("does-not-exist.html").is_none());
    }
}
