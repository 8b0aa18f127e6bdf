// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;
use regocore::*;

const CONCAT_DECL: &str = r#"{
  "type": "function",
  "args": [
    { "type": "string", "name": "delimiter", "description": "string to use as a delimiter" },
    {
      "type": "any",
      "of": [
        { "type": "array", "dynamic": { "type": "string" } },
        { "type": "set", "of": { "type": "string" } }
      ],
      "name": "collection"
    }
  ],
  "result": { "type": "string", "name": "output" }
}"#;

#[test]
fn decl_round_trip() -> Result<()> {
    let json: serde_json::Value = serde_json::from_str(CONCAT_DECL)?;
    let ty = RegoType::from_json_value(&json)?;

    let f = ty.as_function().ok_or_else(|| anyhow::anyhow!("not a function"))?;
    assert_eq!(f.args.len(), 2);
    assert!(f.variadic.is_none());

    assert_eq!(ty.to_json_value()?, json);
    Ok(())
}

#[test]
fn named_types_are_flattened() -> Result<()> {
    let ty = RegoType::Number.named("x").described("an input");
    let json = ty.to_json_str()?;
    let v: serde_json::Value = serde_json::from_str(&json)?;

    assert_eq!(v["type"], "number");
    assert_eq!(v["name"], "x");
    assert_eq!(v["description"], "an input");
    assert_eq!(RegoType::from_json_str(&json)?, ty);
    assert_eq!(ty.unnamed(), &RegoType::Number);
    Ok(())
}

#[test]
fn decode_errors() {
    assert_eq!(
        RegoType::from_json_str(r#"{"type": "tuple"}"#),
        Err(TypeError::UnknownTypeMarker("tuple".to_string()))
    );
    assert_eq!(
        RegoType::from_json_str(r#"{"of": []}"#),
        Err(TypeError::MissingTypeMarker)
    );
    assert!(RegoType::from_json_str("[]").is_err());
}

#[test]
fn matches_declared_arguments() -> Result<()> {
    let ty = RegoType::from_json_str(CONCAT_DECL)?;
    let f = ty.as_function().ok_or_else(|| anyhow::anyhow!("not a function"))?;
    let collection = f.arg_type(1).ok_or_else(|| anyhow::anyhow!("missing arg"))?;

    assert!(collection.matches(&Value::from_json_str(r#"["a", "b"]"#)?));
    assert!(collection.matches(&Value::from_set(
        [Value::from("a")].into_iter().collect()
    )));
    assert!(!collection.matches(&Value::from_json_str(r#"["a", 1]"#)?));
    assert!(!collection.matches(&Value::from("a")));
    Ok(())
}

#[test]
fn object_properties() -> Result<()> {
    let ty = RegoType::from_json_str(
        r#"{
          "type": "object",
          "static": [ { "key": "id", "value": { "type": "number" } } ],
          "dynamic": { "key": { "type": "string" }, "value": { "type": "boolean" } }
        }"#,
    )?;

    assert!(ty.matches(&Value::from_json_str(r#"{"id": 1}"#)?));
    assert!(ty.matches(&Value::from_json_str(r#"{"id": 1, "ok": true}"#)?));
    assert!(!ty.matches(&Value::from_json_str(r#"{"ok": true}"#)?));
    assert!(!ty.matches(&Value::from_json_str(r#"{"id": "1"}"#)?));
    assert!(!ty.matches(&Value::from_json_str(r#"{"id": 1, "ok": 1}"#)?));
    Ok(())
}

#[test]
fn any_accepts_everything() {
    let any = RegoType::any();
    assert!(any.matches(&Value::Null));
    assert!(any.matches(&Value::new_set()));
    assert_eq!(any.to_string(), "any");
}

#[test]
fn registry_declarations_decode() -> Result<()> {
    let registry = BuiltinRegistry::default();
    for name in registry.supported_builtin_names() {
        let meta = registry
            .metadata(&name)
            .ok_or_else(|| anyhow::anyhow!("no metadata for {name}"))?;
        let json = RegoType::Function(meta.decl.clone()).to_json_value()?;
        assert_eq!(
            RegoType::from_json_value(&json)?,
            RegoType::Function(meta.decl.clone()),
            "{name}"
        );
    }
    Ok(())
}

#[test]
fn collection_constructors() -> Result<()> {
    let tags = RegoType::set_of(RegoType::String);
    assert!(tags.matches(&Value::from_set([Value::from("a")].into_iter().collect())));
    assert!(!tags.matches(&Value::from_json_str(r#"["a"]"#)?));
    assert_eq!(tags.to_string(), "set[string]");

    let counts = RegoType::object_of(RegoType::String, RegoType::Number);
    assert!(counts.matches(&Value::from_json_str(r#"{"a": 1, "b": 2}"#)?));
    assert!(!counts.matches(&Value::from_json_str(r#"{"a": "1"}"#)?));
    assert_eq!(
        RegoType::from_json_str(&counts.to_json_str()?)?,
        counts
    );
    Ok(())
}
