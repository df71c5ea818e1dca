//! Filesystem seam used for reading statements and writing reports.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

pub trait FileSystem: Send + Sync {
    /// Every regular file below `root`, recursively, in sorted order.
    fn walk(&self, root: &Path) -> io::Result<Vec<PathBuf>>;

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// Writes `contents` to `path`, creating missing parent directories.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Removes `path` and everything below it. A missing path is not an error.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl OsFileSystem {
    fn walk_into(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                Self::walk_into(&path, files)?;
            } else if file_type.is_file() {
                files.push(path);
            }
        }
        Ok(())
    }
}

impl FileSystem for OsFileSystem {
    fn walk(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if root.is_file() {
            files.push(root.to_path_buf());
        } else {
            Self::walk_into(root, &mut files)?;
        }
        files.sort();
        Ok(files)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(io::BufReader::new(fs::File::open(path)?)))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        match fs::remove_dir_all(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// In-memory filesystem. Clones share the same files.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.lock().insert(path.into(), contents.into());
    }

    pub fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Vec<u8>>> {
        // A poisoned map is still structurally valid.
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FileSystem for MemoryFileSystem {
    fn walk(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .lock()
            .keys()
            .filter(|path| path.starts_with(root))
            .cloned()
            .collect())
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let bytes = self
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.lock().insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.lock().retain(|file, _| !file.starts_with(path));
        Ok(())
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("file not found: {}", path.display()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_fs_walk_is_scoped_and_sorted() {
        let fs = MemoryFileSystem::new();
        fs.insert("/bank/bni/b.csv", "x");
        fs.insert("/bank/bca/a.csv", "x");
        fs.insert("/system/s.csv", "x");

        let files = fs.walk(Path::new("/bank")).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("/bank/bca/a.csv"), PathBuf::from("/bank/bni/b.csv")]
        );
    }

    #[test]
    fn test_memory_fs_open_and_remove() {
        let fs = MemoryFileSystem::new();
        fs.write(Path::new("/report/bank/x.csv"), b"hello").unwrap();

        let mut content = String::new();
        fs.open(Path::new("/report/bank/x.csv"))
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "hello");

        fs.remove_dir_all(Path::new("/report/bank")).unwrap();
        assert!(!fs.exists(Path::new("/report/bank/x.csv")));
        assert!(fs.open(Path::new("/report/bank/x.csv")).is_err());
    }

    #[test]
    fn test_os_fs_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fs = OsFileSystem;
        let nested = dir.path().join("report/system/matched/m.csv");

        fs.write(&nested, b"a,b\n").unwrap();
        assert_eq!(fs.walk(dir.path()).unwrap(), vec![nested.clone()]);

        fs.remove_dir_all(&dir.path().join("report")).unwrap();
        fs.remove_dir_all(&dir.path().join("report")).unwrap();
        assert!(fs.walk(dir.path()).unwrap().is_empty());
    }
}
