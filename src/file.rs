//! File-backed key-value store, the default persistence medium.

use crate::storage::{KeyValueStore, StorageError};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Environment variable naming the directory used by [`FileStore::from_env`].
pub const DIR_ENV: &str = "PERSISTSTATE_DIR";

/// A [`KeyValueStore`] keeping one file per key in a directory.
///
/// Each key maps to `<dir>/<escaped key>.json`. Writes go to a `.tmp` file
/// first, are synced, then renamed over the final path, so a crash mid-write
/// leaves the previous value intact. Readers and writers coordinate through
/// an advisory lock on `<dir>/.lock` (shared for reads, exclusive for
/// writes), which also keeps separate processes from interleaving.
///
/// The directory is created on the first write; reading from a directory
/// that does not exist yields `None`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        FileStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Store rooted at `$PERSISTSTATE_DIR`, or `<temp dir>/persiststate`
    /// when the variable is unset or empty.
    pub fn from_env() -> Self {
        FileStore::new(dir_from(std::env::var_os(DIR_ENV)))
    }

    /// Returns the storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", escape_key(key)))
    }

    fn lock(&self, exclusive: bool) -> io::Result<File> {
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(".lock"))?;
        if exclusive {
            FileExt::lock_exclusive(&lock_file)?;
        } else {
            FileExt::lock_shared(&lock_file)?;
        }
        Ok(lock_file)
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if !self.dir.is_dir() {
            return Ok(None);
        }

        let _lock = self.lock(false)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let _lock = self.lock(true)?;

        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");

        let mut file = File::create(&tmp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_data()?;
        drop(file);

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if !self.dir.is_dir() {
            return Ok(());
        }

        let _lock = self.lock(true)?;
        let path = self.path_for(key);
        for path in [path.with_extension("json.tmp"), path] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

fn dir_from(var: Option<OsString>) -> PathBuf {
    match var {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::temp_dir().join("persiststate"),
    }
}

/// Escape a key into a file stem. ASCII alphanumerics, `-` and `_` are kept;
/// every other byte becomes `%XX`, so distinct keys never share a file.
fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }
    escaped
}
