use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::engine::models::{AppRecord, CatalogEntry, Manifest};
use crate::error::StoreError;

pub const MANIFEST_FILE: &str = "AllApps.json";
pub const DETAILS_DIR: &str = "jsons";
const DETAIL_SUFFIX: &str = ".json";

/// Owner of the persisted manifest and of the per-identifier detail documents.
#[derive(Clone, Debug)]
pub struct ManifestStore {
    root: PathBuf,
}

impl ManifestStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn details_dir(&self) -> PathBuf {
        self.root.join(DETAILS_DIR)
    }

    pub fn detail_path(&self, identifier: &str) -> PathBuf {
        self.details_dir()
            .join(format!("{}{DETAIL_SUFFIX}", normalize_identifier(identifier)))
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest_path().is_file()
    }

    /// Read the last-known manifest. A missing file is the first-run state, not an error.
    pub fn load(&self) -> Result<Manifest, StoreError> {
        let path = self.manifest_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("store: no manifest at {}, starting empty", path.display());
                return Ok(Manifest::new());
            }
            Err(err) => return Err(StoreError::io(&path, &err)),
        };
        serde_json::from_slice(&bytes).map_err(|e| StoreError::decode(&path, &e))
    }

    /// Replace the persisted manifest; readers see either the old or the new file.
    pub fn save(&self, manifest: &Manifest) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(manifest).map_err(|e| StoreError::Encode {
            what: "manifest",
            message: e.to_string(),
        })?;
        let path = self.manifest_path();
        write_atomic(&path, &bytes).map_err(|e| StoreError::io(&path, &e))?;
        debug!(
            "store: saved manifest with {} entries to {}",
            manifest.len(),
            path.display()
        );
        Ok(())
    }

    pub fn write_detail(&self, identifier: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.detail_path(identifier);
        write_atomic(&path, bytes).map_err(|e| StoreError::io(&path, &e))?;
        Ok(path)
    }

    pub fn read_detail(&self, identifier: &str) -> Result<AppRecord, StoreError> {
        let path = self.detail_path(identifier);
        let bytes = fs::read(&path).map_err(|e| StoreError::io(&path, &e))?;
        AppRecord::from_slice(&bytes).map_err(|e| StoreError::decode(&path, &e))
    }

    pub fn remove_detail(&self, identifier: &str) -> Result<(), StoreError> {
        let path = self.detail_path(identifier);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::io(&path, &err)),
        }
    }

    /// Decode the cached detail of every identifier the manifest lists.
    ///
    /// One unreadable record never hides the others; failures come back per identifier.
    pub fn load_records(
        &self,
        manifest: &Manifest,
    ) -> (Vec<CatalogEntry>, Vec<(String, StoreError)>) {
        let mut entries = Vec::with_capacity(manifest.len());
        let mut failures = Vec::new();
        for identifier in manifest.identifiers() {
            match self.read_detail(identifier) {
                Ok(record) => entries.push(CatalogEntry {
                    identifier: identifier.to_owned(),
                    record,
                }),
                Err(err) => {
                    warn!("store: skipping cached record {identifier}: {err}");
                    failures.push((identifier.to_owned(), err));
                }
            }
        }
        (entries, failures)
    }

    /// File stems of the detail documents currently on disk (normalized identifiers).
    pub fn detail_stems(&self) -> Vec<String> {
        let dir = self.details_dir();
        if !dir.is_dir() {
            return Vec::new();
        }
        let mut stems: Vec<String> = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_suffix(DETAIL_SUFFIX))
                    .map(str::to_owned)
            })
            .collect();
        stems.sort();
        stems
    }
}

/// Map an identifier to a file stem that is valid on every supported platform.
///
/// The same mapping is used on write and read, so lookups always round-trip.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(ErrorKind::InvalidInput, "cache path has no parent")
    })?;
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("cache");
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let pid = std::process::id();

    let mut tmp_path = None;
    for attempt in 0..16_u8 {
        let candidate = parent.join(format!(".{file_name}.{pid}.{timestamp}.{attempt}.tmp"));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(mut file) => {
                let written = file.write_all(data).and_then(|()| file.sync_all());
                if let Err(err) = written {
                    let _ = fs::remove_file(&candidate);
                    return Err(err);
                }
                tmp_path = Some(candidate);
                break;
            }
            Err(error) if error.kind() == ErrorKind::AlreadyExists => {}
            Err(error) => return Err(error),
        }
    }

    let Some(tmp_path) = tmp_path else {
        return Err(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "failed to create unique temp file",
        ));
    };

    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> Manifest {
        [("Poster 2", "2.8.12"), ("SubRee", "1.1.1"), ("Foo/Bar", "3")]
            .into_iter()
            .collect()
    }

    const DETAIL: &str = r#"{"platform":"macOS","lang":"en","name":"SubRee","version":"1.1.1"}"#;

    #[test]
    fn load_without_file_yields_empty_manifest() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let store = ManifestStore::new(temp_dir.path().join("never-created"));

        let loaded = store.load().expect("missing manifest is not an error");

        assert!(loaded.is_empty());
        assert!(!store.has_manifest());
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let store = ManifestStore::new(temp_dir.path());
        let manifest = sample_manifest();

        store.save(&manifest).expect("manifest should save");

        assert!(store.has_manifest());
        assert_eq!(store.load().expect("manifest should load"), manifest);
    }

    #[test]
    fn empty_manifest_round_trips() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let store = ManifestStore::new(temp_dir.path());

        store.save(&Manifest::new()).expect("manifest should save");

        assert!(store.load().expect("manifest should load").is_empty());
    }

    #[test]
    fn malformed_manifest_is_a_decode_error() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let store = ManifestStore::new(temp_dir.path());
        fs::write(store.manifest_path(), "{not-valid-json").expect("fixture should be written");

        assert!(matches!(store.load(), Err(StoreError::Decode { .. })));
    }

    #[test]
    fn save_replaces_existing_file_without_leftovers() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let store = ManifestStore::new(temp_dir.path());
        fs::write(store.manifest_path(), "{not-valid-json").expect("fixture should be written");

        store.save(&sample_manifest()).expect("manifest should save");

        assert_eq!(store.load().expect("manifest should load"), sample_manifest());
        let temp_files = fs::read_dir(temp_dir.path())
            .expect("read temp dir entries")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(temp_files, 0);
    }

    #[test]
    fn normalization_removes_path_separators() {
        assert_eq!(normalize_identifier("Foo/Bar"), "Foo_Bar");
        assert_eq!(normalize_identifier(r"a\b:c"), "a_b_c");
        assert_eq!(normalize_identifier("Poster 2"), "Poster 2");
        assert_eq!(normalize_identifier("Foo/Bar"), normalize_identifier("Foo/Bar"));
    }

    #[test]
    fn detail_round_trips_for_identifier_with_slash() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let store = ManifestStore::new(temp_dir.path());

        let path = store
            .write_detail("SubRee/macOS", DETAIL.as_bytes())
            .expect("detail should be written");

        assert_eq!(path, temp_dir.path().join("jsons").join("SubRee_macOS.json"));
        let record = store.read_detail("SubRee/macOS").expect("detail should read");
        assert_eq!(record.name, "SubRee");
        assert_eq!(store.detail_stems(), vec!["SubRee_macOS".to_owned()]);
    }

    #[test]
    fn load_records_reports_failures_per_identifier() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let store = ManifestStore::new(temp_dir.path());
        store
            .write_detail("SubRee", DETAIL.as_bytes())
            .expect("detail should be written");
        store
            .write_detail("Broken", b"{oops")
            .expect("detail should be written");
        let manifest: Manifest = [("SubRee", "1.1.1"), ("Broken", "1"), ("Missing", "1")]
            .into_iter()
            .collect();

        let (entries, failures) = store.load_records(&manifest);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].identifier, "SubRee");
        let mut failed: Vec<&str> = failures.iter().map(|(id, _)| id.as_str()).collect();
        failed.sort_unstable();
        assert_eq!(failed, vec!["Broken", "Missing"]);
    }

    #[test]
    fn remove_detail_tolerates_missing_file() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let store = ManifestStore::new(temp_dir.path());
        store
            .write_detail("SubRee", DETAIL.as_bytes())
            .expect("detail should be written");

        store.remove_detail("SubRee").expect("remove should succeed");
        store.remove_detail("SubRee").expect("second remove should succeed");

        assert!(store.detail_stems().is_empty());
    }
}
