// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::bundle::directory::DirectoryLoader;
use crate::bundle::{
    Bundle, BundleError, BundleFile, Manifest, DATA_FILE, MANIFEST_FILE, PLAN_FILE,
    REGO_EXTENSION,
};
use crate::value::{Value, ValueError};

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("unexpected manifest `{0}`; a bundle has at most one, at its root")]
    UnexpectedManifest(String),

    #[error("data file `{0}` at the bundle root must hold an object")]
    UnexpectedData(String),

    #[error("failed to parse manifest `{0}`: {1}")]
    ManifestParseError(String, String),

    #[error("failed to parse data file `{0}`: {1}")]
    DataParseError(String, String),

    #[error("failed to merge data file `{0}`: {1}")]
    DataMergeError(String, ValueError),

    #[error("bundle data lies outside the manifest roots")]
    DataEscapedRoot,

    #[error("unsupported bundle source: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error("failed to read `{path}`: {message}")]
    Io { path: String, message: String },

    #[error("file `{path}` is {size} bytes, over the {max} byte limit")]
    FileSizeExceeded { path: String, size: u64, max: u64 },
}

impl LoadError {
    pub(crate) fn io(path: &Path, e: impl core::fmt::Display) -> Self {
        LoadError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    }
}

/// Assembles a [`Bundle`] from a sequence of files.
///
/// The first failed file aborts the load. `.rego` and `plan.json` files are
/// ordered by path, so the result does not depend on enumeration order.
pub struct BundleLoader {
    files: Box<dyn Iterator<Item = Result<BundleFile, LoadError>>>,
}

impl core::fmt::Debug for BundleLoader {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("BundleLoader").finish_non_exhaustive()
    }
}

impl BundleLoader {
    pub fn new<I>(files: I) -> Self
    where
        I: IntoIterator<Item = Result<BundleFile, LoadError>>,
        I::IntoIter: 'static,
    {
        Self {
            files: Box::new(files.into_iter()),
        }
    }

    pub fn from_files(files: Vec<BundleFile>) -> Self {
        Self::new(files.into_iter().map(Ok))
    }

    pub fn load(self) -> Result<Bundle, LoadError> {
        let files = self.files.collect::<Result<Vec<_>, _>>()?;

        let mut rego_files = vec![];
        let mut plan_files = vec![];
        let mut manifest: Option<Manifest> = None;
        let mut data = Value::new_object();

        for f in files {
            let name = f.file_name().to_string();
            match name.as_str() {
                MANIFEST_FILE => {
                    if manifest.is_some() || f.path != MANIFEST_FILE {
                        return Err(LoadError::UnexpectedManifest(f.path));
                    }
                    debug!(path = %f.path, "manifest");
                    manifest = Some(
                        Manifest::from_json(&f.data)
                            .map_err(|e| LoadError::ManifestParseError(f.path.clone(), e.to_string()))?,
                    );
                }
                DATA_FILE => {
                    debug!(path = %f.path, "data");
                    let parsed = Value::from_json_bytes(&f.data)
                        .map_err(|e| LoadError::DataParseError(f.path.clone(), e.to_string()))?;

                    let segments = f.dir_segments();
                    if segments.is_empty() && !matches!(parsed, Value::Object(_)) {
                        return Err(LoadError::UnexpectedData(f.path));
                    }
                    data.merge_at(&segments, parsed)
                        .map_err(|e| LoadError::DataMergeError(f.path.clone(), e))?;
                }
                PLAN_FILE => {
                    debug!(path = %f.path, "plan");
                    plan_files.push(f);
                }
                _ if f.extension() == Some(REGO_EXTENSION) => {
                    debug!(path = %f.path, "policy");
                    rego_files.push(f);
                }
                _ => debug!(path = %f.path, "skipping non-bundle file"),
            }
        }

        rego_files.sort_by(|a, b| a.path.cmp(&b.path));
        plan_files.sort_by(|a, b| a.path.cmp(&b.path));

        let bundle = Bundle::new(manifest.unwrap_or_default(), plan_files, rego_files, data)?;
        if !bundle.roots_contain(&bundle.data) {
            return Err(LoadError::DataEscapedRoot);
        }

        info!(
            rego_files = bundle.rego_files.len(),
            plan_files = bundle.plan_files.len(),
            roots = ?bundle.manifest.roots,
            revision = %bundle.manifest.revision,
            "loaded bundle"
        );
        Ok(bundle)
    }

    pub fn load_from_directory(path: impl AsRef<Path>) -> Result<Bundle, LoadError> {
        BundleLoader::new(DirectoryLoader::new(path)).load()
    }

    #[cfg(feature = "tarball")]
    pub fn load_from_tarball(path: impl AsRef<Path>) -> Result<Bundle, LoadError> {
        BundleLoader::new(crate::bundle::TarballLoader::new(path)).load()
    }

    /// Loads a directory, or a file as a gzipped tarball.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Bundle, LoadError> {
        let path = path.as_ref();
        if path.is_dir() {
            return Self::load_from_directory(path);
        }

        #[cfg(feature = "tarball")]
        {
            Self::load_from_tarball(path)
        }
        #[cfg(not(feature = "tarball"))]
        {
            Err(LoadError::Unsupported(format!(
                "`{}` is not a directory; only directories can be loaded as bundles",
                path.display()
            )))
        }
    }
}
