use std::fs;
use std::io::{self, Cursor, Read, Seek};

use log::{debug, info};
use zip::read::ZipArchive;

use crate::error::SeedError;
use crate::storage::ManifestStore;

/// Default catalog shipped with the binary: `AllApps.json` plus `jsons/*.json`.
pub const BUNDLED_ARCHIVE: &[u8] = include_bytes!("../../assets/AllApps.zip");

/// Extract `archive` into the store root when no manifest has been cached yet.
///
/// Returns `true` when the archive was extracted.
pub fn seed_if_missing(store: &ManifestStore, archive: &[u8]) -> Result<bool, SeedError> {
    if store.has_manifest() {
        debug!("seed: cached manifest present, skipping bundled data");
        return Ok(false);
    }
    info!("seed: no cached manifest, extracting bundled data");
    let extracted = extract_zip(Cursor::new(archive), store)?;
    info!(
        "seed: extracted {} files into {}",
        extracted,
        store.root().display()
    );
    Ok(true)
}

fn extract_zip<R: Read + Seek>(reader: R, store: &ManifestStore) -> Result<usize, SeedError> {
    let root = store.root();
    fs::create_dir_all(root).map_err(|e| SeedError::io(root, &e))?;
    let mut archive =
        ZipArchive::new(reader).map_err(|e| SeedError::Archive(format!("zip parse error: {e}")))?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| SeedError::Archive(format!("zip entry error: {e}")))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(SeedError::Archive(format!(
                "entry {} escapes the cache directory",
                entry.name()
            )));
        };
        // macOS archivers add resource-fork shadows.
        if relative.starts_with("__MACOSX") {
            continue;
        }
        let out_path = root.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| SeedError::io(&out_path, &e))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| SeedError::io(parent, &e))?;
        }
        let mut out_file = fs::File::create(&out_path).map_err(|e| SeedError::io(&out_path, &e))?;
        io::copy(&mut entry, &mut out_file).map_err(|e| SeedError::io(&out_path, &e))?;
        extracted += 1;
    }
    Ok(extracted)
}
