// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::bundle::{is_bundle_file, BundleFile, LoadError};

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, warn};

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

type PathFilter = Box<dyn Fn(&str) -> bool>;

/// Bundle files inside a gzipped tarball.
pub struct TarballLoader {
    path: PathBuf,
    filter: Option<PathFilter>,
    max_file_size: u64,
}

impl core::fmt::Debug for TarballLoader {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("TarballLoader")
            .field("path", &self.path)
            .field("max_file_size", &self.max_file_size)
            .finish_non_exhaustive()
    }
}

// Archives written by `tar -C dir .` prefix every entry with "./".
fn normalize(path: &str) -> &str {
    let mut path = path;
    loop {
        if let Some(p) = path.strip_prefix("./") {
            path = p;
        } else if let Some(p) = path.strip_prefix('/') {
            path = p;
        } else {
            return path;
        }
    }
}

impl TarballLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            filter: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Skips entries whose normalized path matches `filter`.
    pub fn with_filter(mut self, filter: impl Fn(&str) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Reads every bundle entry of the archive.
    pub fn read_files(&self) -> Result<Vec<BundleFile>, LoadError> {
        let file = File::open(&self.path).map_err(|e| LoadError::io(&self.path, e))?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        let entries = archive
            .entries()
            .map_err(|e| LoadError::io(&self.path, e))?;

        let mut files = vec![];
        for entry in entries {
            let mut entry = entry.map_err(|e| LoadError::io(&self.path, e))?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let raw = entry
                .path()
                .map_err(|e| LoadError::io(&self.path, e))?
                .to_string_lossy()
                .to_string();
            let rel = normalize(&raw).to_string();

            if !is_bundle_file(&rel) {
                continue;
            }
            if let Some(filter) = &self.filter {
                if filter(&rel) {
                    debug!(path = %rel, "filtered out");
                    continue;
                }
            }

            let size = entry.size();
            if size > self.max_file_size {
                warn!(path = %rel, size, max = self.max_file_size, "tarball entry too large");
                return Err(LoadError::FileSizeExceeded {
                    path: rel,
                    size,
                    max: self.max_file_size,
                });
            }

            let mut data = Vec::with_capacity(size as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|e| LoadError::io(Path::new(&rel), e))?;
            files.push(BundleFile::new(rel, data));
        }
        Ok(files)
    }
}

impl IntoIterator for TarballLoader {
    type Item = Result<BundleFile, LoadError>;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        match self.read_files() {
            Ok(files) => files.into_iter().map(Ok).collect::<Vec<_>>().into_iter(),
            Err(e) => vec![Err(e)].into_iter(),
        }
    }
}
