// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! OPA bundles: policy sources, compiled plans and a data tree, scoped by the
//! roots declared in the bundle manifest.

pub mod directory;
pub mod loader;
#[cfg(feature = "tarball")]
pub mod tarball;
mod trie;

pub use directory::DirectoryLoader;
pub use loader::{BundleLoader, LoadError};
#[cfg(feature = "tarball")]
pub use tarball::TarballLoader;

use crate::value::Value;
use trie::TrieNode;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

const MANIFEST_FILE: &str = ".manifest";
const DATA_FILE: &str = "data.json";
const PLAN_FILE: &str = "plan.json";
const REGO_EXTENSION: &str = "rego";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BundleError {
    #[error("manifest roots overlap at `{0}`")]
    OverlappingRoots(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

/// Version of the Rego language the bundle's policies are written in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RegoVersion {
    V0,
    #[default]
    V1,
}

impl TryFrom<u8> for RegoVersion {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(RegoVersion::V0),
            1 => Ok(RegoVersion::V1),
            v => Err(format!("unsupported rego_version {v}")),
        }
    }
}

impl From<RegoVersion> for u8 {
    fn from(v: RegoVersion) -> u8 {
        match v {
            RegoVersion::V0 => 0,
            RegoVersion::V1 => 1,
        }
    }
}

fn default_roots() -> Vec<String> {
    vec![String::new()]
}

// An empty roots list means the same as no roots list: the bundle owns all data.
fn deserialize_roots<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let roots = Vec::<String>::deserialize(deserializer)?;
    if roots.is_empty() {
        return Ok(default_roots());
    }
    Ok(roots)
}

fn null_metadata() -> Value {
    Value::Null
}

/// Contents of a bundle's `.manifest` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub revision: String,

    #[serde(default = "default_roots", deserialize_with = "deserialize_roots")]
    pub roots: Vec<String>,

    #[serde(default)]
    pub rego_version: RegoVersion,

    #[serde(default = "null_metadata")]
    pub metadata: Value,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            revision: String::new(),
            roots: default_roots(),
            rego_version: RegoVersion::V1,
            metadata: Value::Null,
        }
    }
}

impl Manifest {
    pub fn from_json(json: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A file inside a bundle. `path` is relative to the bundle root and uses `/`
/// separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BundleFile {
    pub path: String,
    pub data: Vec<u8>,
}

impl BundleFile {
    pub fn new(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        file_name(&self.path)
    }

    pub fn extension(&self) -> Option<&str> {
        extension(&self.path)
    }

    /// Directory segments leading to the file, without empty segments.
    pub fn dir_segments(&self) -> Vec<&str> {
        let mut segments: Vec<&str> = self.path.split('/').filter(|s| !s.is_empty()).collect();
        segments.pop();
        segments
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(p) => Some(&name[p + 1..]),
    }
}

/// Whether a relative path names a file that belongs in a bundle.
pub fn is_bundle_file(path: &str) -> bool {
    matches!(file_name(path), MANIFEST_FILE | DATA_FILE | PLAN_FILE)
        || extension(path) == Some(REGO_EXTENSION)
}

/// Policies, plans and data installed together.
///
/// Only [`BundleLoader`] and [`Bundle::new`] construct bundles, and both
/// validate the manifest roots first.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub manifest: Manifest,
    pub plan_files: Vec<BundleFile>,
    pub rego_files: Vec<BundleFile>,
    pub data: Value,
    roots_trie: TrieNode,
}

impl Bundle {
    pub fn new(
        manifest: Manifest,
        plan_files: Vec<BundleFile>,
        rego_files: Vec<BundleFile>,
        data: Value,
    ) -> Result<Self, BundleError> {
        // An absent roots list is [""], never [].
        if manifest.roots.is_empty() {
            return Err(BundleError::InternalError("no roots in manifest".to_string()));
        }

        let roots_trie = TrieNode::from_roots(&manifest.roots)?;
        Ok(Self {
            manifest,
            plan_files,
            rego_files,
            data,
            roots_trie,
        })
    }

    /// Whether every path in `data` lies under one of the manifest roots.
    pub fn roots_contain(&self, data: &Value) -> bool {
        self.roots_trie.contains(data)
    }

    /// Whether `path` is owned by the bundle or leads to one of its roots.
    pub fn owns_path(&self, path: &[&str]) -> bool {
        self.roots_trie.covers(path)
    }
}
