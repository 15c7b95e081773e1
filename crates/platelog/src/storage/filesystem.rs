use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

use super::ImageStore;

/// Image store backed by a flat local directory.
pub struct FileImageStore {
    root: PathBuf,
}

impl FileImageStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a key to a path inside the root, refusing anything that
    /// could escape it.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let is_plain = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains('/')
            && !key.contains('\\');
        if !is_plain {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Creates the file with `O_EXCL`, trying `name`, `name_2`, `name_3`, …
    /// so two uploads of the same name never overwrite each other.
    fn create_exclusive(&self, key: &str, content: &[u8]) -> Result<String, StorageError> {
        let (base, ext) = match key.rfind('.') {
            Some(dot_pos) if dot_pos > 0 => (&key[..dot_pos], Some(&key[dot_pos..])),
            _ => (key, None),
        };

        for counter in 1..=1000 {
            let candidate = if counter == 1 {
                key.to_string()
            } else {
                match ext {
                    Some(ext) => format!("{}_{}{}", base, counter, ext),
                    None => format!("{}_{}", base, counter),
                }
            };

            let path = self.root.join(&candidate);
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(mut file) => {
                    file.write_all(content)
                        .map_err(|e| StorageError::WriteFile {
                            path: path.clone(),
                            source: e,
                        })?;
                    return Ok(candidate);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StorageError::WriteFile { path, source: e }),
            }
        }

        Err(StorageError::FileExists(self.root.join(key)))
    }
}

impl ImageStore for FileImageStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        self.path_for(key)?;
        self.ensure_directory(&self.root)?;

        let stored = self.create_exclusive(key, bytes)?;
        log::debug!("Stored image {} ({} bytes)", stored, bytes.len());
        Ok(stored)
    }

    fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::ReadFile { path, source: e }
            }
        })
    }

    fn exists(&self, key: &str) -> bool {
        self.path_for(key).map(|p| p.is_file()).unwrap_or(false)
    }
}
