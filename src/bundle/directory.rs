// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::bundle::{is_bundle_file, BundleFile, LoadError};

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

type PathFilter = Box<dyn Fn(&str) -> bool>;

/// Bundle files found under a directory.
///
/// Yields only files a bundle cares about, with paths relative to the
/// directory. I/O failures are yielded as errors carrying the failing path.
pub struct DirectoryLoader {
    root: PathBuf,
    filter: Option<PathFilter>,
    max_file_size: Option<u64>,
}

impl core::fmt::Debug for DirectoryLoader {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("DirectoryLoader")
            .field("root", &self.root)
            .field("max_file_size", &self.max_file_size)
            .finish_non_exhaustive()
    }
}

impl DirectoryLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            filter: None,
            max_file_size: None,
        }
    }

    /// Skips files whose relative path matches `filter`.
    pub fn with_filter(mut self, filter: impl Fn(&str) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }
}

impl IntoIterator for DirectoryLoader {
    type Item = Result<BundleFile, LoadError>;
    type IntoIter = DirectoryFiles;

    fn into_iter(self) -> DirectoryFiles {
        DirectoryFiles {
            walker: WalkDir::new(&self.root).sort_by_file_name().into_iter(),
            loader: self,
        }
    }
}

pub struct DirectoryFiles {
    walker: walkdir::IntoIter,
    loader: DirectoryLoader,
}

impl DirectoryFiles {
    fn read(&self, path: &Path, rel: String) -> Result<BundleFile, LoadError> {
        if let Some(max) = self.loader.max_file_size {
            let size = std::fs::metadata(path)
                .map_err(|e| LoadError::io(path, e))?
                .len();
            if size > max {
                return Err(LoadError::FileSizeExceeded {
                    path: rel,
                    size,
                    max,
                });
            }
        }

        let data = std::fs::read(path).map_err(|e| LoadError::io(path, e))?;
        Ok(BundleFile::new(rel, data))
    }
}

impl Iterator for DirectoryFiles {
    type Item = Result<BundleFile, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(self.loader.root.as_path()).to_path_buf();
                    return Some(Err(LoadError::io(&path, e)));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(rel) = entry.path().strip_prefix(&self.loader.root) else {
                continue;
            };
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if !is_bundle_file(&rel) {
                continue;
            }
            if let Some(filter) = &self.loader.filter {
                if filter(&rel) {
                    debug!(path = %rel, "filtered out");
                    continue;
                }
            }

            return Some(self.read(entry.path(), rel));
        }
    }
}
