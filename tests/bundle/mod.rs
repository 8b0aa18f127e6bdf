// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fs;
use std::path::Path;

use anyhow::Result;
use regocore::bundle::*;
use regocore::Value;

fn write(root: &Path, rel: &str, contents: &str) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

fn paths(files: &[BundleFile]) -> Vec<&str> {
    files.iter().map(|f| f.path.as_str()).collect()
}

#[test]
fn load_directory() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    write(root, ".manifest", r#"{"revision": "r7", "roots": ["a", "foo"]}"#)?;
    write(root, "a/data.json", r#"{"x": 1}"#)?;
    write(root, "a/policy.rego", "package a\n")?;
    write(root, "foo/bar/plan.json", "{}")?;
    write(root, "README.md", "not part of the bundle")?;

    let bundle = BundleLoader::load_from_directory(root)?;

    assert_eq!(bundle.manifest.revision, "r7");
    assert_eq!(bundle.manifest.rego_version, RegoVersion::V1);
    assert_eq!(bundle.data, Value::from_json_str(r#"{"a": {"x": 1}}"#)?);
    assert_eq!(paths(&bundle.rego_files), vec!["a/policy.rego"]);
    assert_eq!(paths(&bundle.plan_files), vec!["foo/bar/plan.json"]);
    assert_eq!(bundle.rego_files[0].data, b"package a\n");

    assert!(bundle.owns_path(&["a", "x"]));
    assert!(bundle.owns_path(&["foo"]));
    assert!(!bundle.owns_path(&["b"]));
    Ok(())
}

#[test]
fn data_must_stay_inside_roots() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    write(root, ".manifest", r#"{"roots": ["a", "foo"]}"#)?;
    write(root, "b/data.json", r#"{"x": 1}"#)?;

    assert!(matches!(
        BundleLoader::load_from_directory(root),
        Err(LoadError::DataEscapedRoot)
    ));
    Ok(())
}

#[test]
fn no_manifest_owns_everything() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    write(root, "data.json", r#"{"top": [1, 2]}"#)?;
    write(root, "b/c/data.json", r#""leaf""#)?;

    let bundle = BundleLoader::load_from_directory(root)?;
    assert_eq!(bundle.manifest, Manifest::default());
    assert_eq!(
        bundle.data,
        Value::from_json_str(r#"{"top": [1, 2], "b": {"c": "leaf"}}"#)?
    );
    assert!(bundle.owns_path(&["anything"]));
    Ok(())
}

#[test]
fn overlapping_roots() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), ".manifest", r#"{"roots": ["a/b", "a"]}"#)?;

    assert!(matches!(
        BundleLoader::load_from_directory(dir.path()),
        Err(LoadError::Bundle(BundleError::OverlappingRoots(_)))
    ));
    Ok(())
}

#[test]
fn misplaced_manifest() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "nested/.manifest", "{}")?;

    match BundleLoader::load_from_directory(dir.path()) {
        Err(LoadError::UnexpectedManifest(path)) => assert_eq!(path, "nested/.manifest"),
        other => anyhow::bail!("unexpected result {other:?}"),
    }
    Ok(())
}

#[test]
fn malformed_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "a/data.json", "{not json")?;
    assert!(matches!(
        BundleLoader::load_from_directory(dir.path()),
        Err(LoadError::DataParseError(p, _)) if p == "a/data.json"
    ));

    let dir = tempfile::tempdir()?;
    write(dir.path(), ".manifest", r#"{"roots": "a"}"#)?;
    assert!(matches!(
        BundleLoader::load_from_directory(dir.path()),
        Err(LoadError::ManifestParseError(..))
    ));
    Ok(())
}

#[test]
fn ordering_is_deterministic() -> Result<()> {
    let files = vec![
        BundleFile::new("z.rego", "package z"),
        BundleFile::new("m/b.rego", "package m.b"),
        BundleFile::new("a.rego", "package a"),
        BundleFile::new("m/plan.json", "{}"),
        BundleFile::new("plan.json", "{}"),
    ];
    let mut reversed = files.clone();
    reversed.reverse();

    let first = BundleLoader::from_files(files).load()?;
    let second = BundleLoader::from_files(reversed).load()?;

    assert_eq!(paths(&first.rego_files), vec!["a.rego", "m/b.rego", "z.rego"]);
    assert_eq!(paths(&first.plan_files), vec!["m/plan.json", "plan.json"]);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn directory_filter_and_size_limit() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    write(root, "p.rego", "package p")?;
    write(root, "tests/p_test.rego", "package p_test")?;

    let bundle = BundleLoader::new(
        DirectoryLoader::new(root).with_filter(|p| p.starts_with("tests/")),
    )
    .load()?;
    assert_eq!(paths(&bundle.rego_files), vec!["p.rego"]);

    let result = BundleLoader::new(DirectoryLoader::new(root).with_max_file_size(4)).load();
    assert!(matches!(result, Err(LoadError::FileSizeExceeded { max: 4, .. })));
    Ok(())
}

#[test]
fn missing_directory() {
    let result = BundleLoader::load_from_directory("/definitely/not/a/bundle/dir");
    assert!(matches!(result, Err(LoadError::Io { .. })));
}

#[cfg(feature = "tarball")]
mod tarball {
    use super::*;

    use std::fs::File;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    // Writes the entry name verbatim so that "./" prefixes survive.
    fn append(builder: &mut tar::Builder<GzEncoder<File>>, path: &str, data: &[u8]) -> Result<()> {
        let mut header = tar::Header::new_gnu();
        {
            let gnu = header
                .as_gnu_mut()
                .ok_or_else(|| anyhow::anyhow!("not a gnu header"))?;
            gnu.name[..path.len()].copy_from_slice(path.as_bytes());
        }
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, data)?;
        Ok(())
    }

    fn tarball(path: &Path, entries: &[(&str, &str)]) -> Result<()> {
        let mut builder = tar::Builder::new(GzEncoder::new(
            File::create(path)?,
            Compression::default(),
        ));
        for (name, data) in entries {
            append(&mut builder, name, data.as_bytes())?;
        }
        builder.into_inner()?.finish()?;
        Ok(())
    }

    #[test]
    fn load_tarball() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bundle.tar.gz");
        tarball(
            &path,
            &[
                ("./.manifest", r#"{"revision": "t1", "roots": ["a"]}"#),
                ("./a/data.json", r#"{"y": true}"#),
                ("./a/z.rego", "package a.z"),
                ("./a/b.rego", "package a.b"),
                ("./notes.txt", "ignored"),
            ],
        )?;

        let bundle = BundleLoader::load_from_tarball(&path)?;
        assert_eq!(bundle.manifest.revision, "t1");
        assert_eq!(bundle.data, Value::from_json_str(r#"{"a": {"y": true}}"#)?);
        assert_eq!(paths(&bundle.rego_files), vec!["a/b.rego", "a/z.rego"]);

        // Paths pick the loader by file kind.
        assert_eq!(BundleLoader::load_from_path(&path)?, bundle);
        Ok(())
    }

    #[test]
    fn tarball_limits() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bundle.tar.gz");
        tarball(
            &path,
            &[("a.rego", "package a"), ("big/data.json", r#"{"k": "0123456789"}"#)],
        )?;

        let result = BundleLoader::new(TarballLoader::new(&path).with_max_file_size(16)).load();
        match result {
            Err(LoadError::FileSizeExceeded { path, max, .. }) => {
                assert_eq!(path, "big/data.json");
                assert_eq!(max, 16);
            }
            other => anyhow::bail!("unexpected result {other:?}"),
        }

        let files = TarballLoader::new(&path)
            .with_filter(|p| p.starts_with("big/"))
            .read_files()?;
        assert_eq!(paths(&files), vec!["a.rego"]);
        Ok(())
    }
}

#[test]
fn load_from_path_directory() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "p.rego", "package p")?;
    let bundle = BundleLoader::load_from_path(dir.path())?;
    assert_eq!(paths(&bundle.rego_files), vec!["p.rego"]);
    Ok(())
}
