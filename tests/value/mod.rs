// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use proptest::prelude::*;
use regocore::*;

#[test]
fn non_string_key() -> Result<()> {
    let mut obj = Value::new_object();

    obj.as_object_mut()?.insert(Value::Null, Value::Null);
    obj.as_object_mut()?.insert(Value::Bool(false), Value::Null);
    obj.as_object_mut()?
        .insert(Value::from(std::f64::consts::PI), Value::Null);
    obj.as_object_mut()?.insert(
        Value::from(vec![
            Value::Bool(true),
            Value::Null,
            Value::from(std::f64::consts::PI),
        ]),
        Value::Null,
    );

    let mut set = Value::new_set();
    set.as_set_mut()?.insert(Value::Bool(true));
    set.as_set_mut()?.insert(Value::Bool(false));
    set.as_set_mut()?.insert(Value::Bool(true));
    set.as_set_mut()?.insert(Value::from(std::f64::consts::PI));
    obj.as_object_mut()?.insert(set, Value::Null);

    let json = obj.to_json_str()?;
    let expected = r#"{
  "null": null,
  "false": null,
  "3.141592653589793": null,
  "[true,null,3.141592653589793]": null,
  "[false,true,3.141592653589793]": null
}"#;
    assert_eq!(json, expected);

    // Keys come back as strings.
    let back = Value::from_json_str(&json)?;
    assert_eq!(back["null"], Value::Null);
    assert_eq!(back[&Value::Null], Value::Undefined);

    Ok(())
}

#[test]
fn undefined_has_no_json() {
    assert_eq!(
        Value::Undefined.to_json_str(),
        Err(ValueError::UndefinedInJson)
    );

    let nested = Value::from(vec![Value::from(1), Value::Undefined]);
    assert_eq!(nested.to_json_bytes(), Err(ValueError::UndefinedInJson));
}

#[test]
fn non_finite_numbers_have_no_json() {
    for v in [Value::from(f64::INFINITY), Value::from(f64::NAN)] {
        assert!(matches!(v.to_json_str(), Err(ValueError::Encode(_))));
    }
}

#[test]
fn large_whole_floats_round_trip() -> Result<()> {
    for f in [1e23, -1.05e23, 2f64.powi(70), f64::MAX] {
        let v = Value::from(f);
        let back = Value::from_json_str(&v.to_json_str()?)?;
        assert_eq!(back, v);
    }
    Ok(())
}

#[test]
fn serialize_number() -> Result<()> {
    // Integral values are serialized without fractional part.
    assert_eq!(Value::from(1.0).to_json_str()?, "1");
    assert_eq!(Value::from(-1.0).to_json_str()?, "-1");

    assert_eq!(Value::from(1.1).to_json_str()?, "1.1");
    assert_eq!(Value::from(-1.1).to_json_str()?, "-1.1");

    // Integers beyond 64 bits survive a round trip exactly.
    let big = "123456789012345678901234567890";
    assert_eq!(Value::from_json_str(big)?.to_json_str()?, big);
    Ok(())
}

#[test]
fn numbers_compare_by_value() -> Result<()> {
    assert_eq!(Value::from(1), Value::from(1.0));
    assert!(Value::from(1) < Value::from(1.5));

    let set = Value::from_set([Value::from(2), Value::from(2.0)].into_iter().collect());
    assert_eq!(set.as_set()?.len(), 1);
    Ok(())
}

#[test]
fn serialize_string() -> Result<()> {
    assert_eq!(
        Value::String("Hello, World\n".into()).to_json_str()?,
        "\"Hello, World\\n\""
    );
    Ok(())
}

#[test]
fn sets_serialize_as_arrays() -> Result<()> {
    let set = Value::from_set(
        [Value::from("b"), Value::from("a")]
            .into_iter()
            .collect::<BTreeSet<_>>(),
    );
    assert_eq!(String::from_utf8(set.to_json_bytes()?)?, r#"["a","b"]"#);
    Ok(())
}

#[test]
fn rego_strings() -> Result<()> {
    assert_eq!(Value::new_set().to_rego_string(), "set()");
    assert_eq!(Value::from("a").to_rego_string(), "\"a\"");

    let v = Value::from_json_str(r#"{"k": [1, "x", null]}"#)?;
    assert_eq!(v.to_rego_string(), r#"{"k": [1, "x", null]}"#);

    let set = Value::from_set([Value::from(2), Value::from(1)].into_iter().collect());
    assert_eq!(set.to_rego_string(), "{1, 2}");
    Ok(())
}

#[test]
fn constructors() -> Result<()> {
    assert_eq!(Value::new_object(), Value::from_json_str("{}")?);
    assert_eq!(Value::new_array(), Value::from_array(vec![]));
    assert!(Value::new_set().as_set()?.is_empty());
    assert_eq!(Value::from_map(BTreeMap::new()), Value::new_object());
    Ok(())
}

#[test]
fn value_as_index() -> Result<()> {
    let idx = Value::from(2);

    let item = Value::from_json_str("[3, 4, 5]")?;
    assert_eq!(&Value::from_json_str("[1, 2, [3, 4, 5]]")?[&idx], &item);

    let idx = Value::from(5);
    assert_eq!(
        &Value::from_json_str("[1, 2, [3, 4, 5]]")?[&idx],
        &Value::Undefined
    );

    // Non indexable values.
    assert_eq!(&Value::Undefined[&idx], &Value::Undefined);
    assert_eq!(&Value::Null[&idx], &Value::Undefined);
    assert_eq!(&Value::Bool(true)[&idx], &Value::Undefined);
    assert_eq!(&Value::String("Hello".into())[&idx], &Value::Undefined);
    assert_eq!(&Value::new_set()[&idx], &Value::Undefined);

    Ok(())
}

#[test]
fn string_and_usize_index() -> Result<()> {
    let obj = Value::from_json_str(r#"{ "a" : 5, "b" : 6 }"#)?;
    assert_eq!(&obj["a"], &Value::from(5));
    assert_eq!(&obj["c"], &Value::Undefined);

    assert_eq!(&Value::from_json_str("[1, 2, 3]")?[0], &Value::from(1));
    assert_eq!(&Value::from_json_str("[1, 2, 3]")?[5], &Value::Undefined);
    Ok(())
}

#[test]
fn api() -> Result<()> {
    let mut v = Value::new_object();
    v.as_object_mut()?
        .insert(Value::String("a".into()), Value::from(3.145));
    assert_eq!(v["a"], Value::from(3.145));
    assert_eq!(v.as_object()?.len(), 1);

    assert!(Value::Undefined.as_object().is_err());
    assert!(Value::Undefined.as_object_mut().is_err());
    assert!(Value::Null.as_set().is_err());
    assert!(Value::Null.as_set_mut().is_err());
    assert!(Value::String("anc".into()).as_array().is_err());
    assert!(Value::String("anc".into()).as_array_mut().is_err());
    assert!(Value::new_object().as_number().is_err());
    assert_eq!(
        Value::from(5.6).as_bool(),
        Err(ValueError::TypeMismatch {
            expected: "boolean",
            found: "number"
        })
    );
    Ok(())
}

#[test]
fn json_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("input.json");
    std::fs::write(&path, r#"{"user": "alice", "roles": ["admin"]}"#)?;

    let v = Value::from_json_file(&path)?;
    assert_eq!(v["roles"][0], Value::from("admin"));

    assert!(matches!(
        Value::from_json_file(dir.path().join("missing.json")),
        Err(ValueError::Decode(_))
    ));
    Ok(())
}

#[test]
fn merge_at_builds_missing_objects() -> Result<()> {
    let mut data = Value::new_object();
    data.merge_at(&["a", "b"], Value::from_json_str(r#"{"x": 1}"#)?)?;
    data.merge_at(&["a"], Value::from_json_str(r#"{"b": {"y": 2}}"#)?)?;
    assert_eq!(
        data,
        Value::from_json_str(r#"{"a": {"b": {"x": 1, "y": 2}}}"#)?
    );

    // Patching leaves the original untouched.
    let patched = data.patch(&["c"], Value::from(true))?;
    assert_eq!(patched["c"], Value::Bool(true));
    assert_eq!(data["c"], Value::Undefined);
    Ok(())
}

#[test]
fn merge_at_conflicts() -> Result<()> {
    let mut data = Value::from_json_str(r#"{"a": {"b": 1}}"#)?;

    assert_eq!(
        data.merge_at(&["a"], Value::from_json_str(r#"{"b": 2}"#)?),
        Err(ValueError::PatchConflict {
            path: "a/b".to_string()
        })
    );
    assert_eq!(
        data.merge_at(&["a", "b", "c"], Value::Null),
        Err(ValueError::PatchConflict {
            path: "a/b".to_string()
        })
    );

    // Identical values do not conflict.
    data.merge_at(&["a"], Value::from_json_str(r#"{"b": 1}"#)?)?;
    Ok(())
}

#[test]
fn kinds_are_ordered() {
    let ordered = vec![
        Value::Null,
        Value::Bool(false),
        Value::Bool(true),
        Value::from(-1),
        Value::from(0.5),
        Value::from("a"),
        Value::from(vec![Value::Null]),
        Value::new_object(),
        Value::new_set(),
        Value::Undefined,
    ];

    let mut shuffled = ordered.clone();
    shuffled.reverse();
    shuffled.sort();
    assert_eq!(shuffled, ordered);
}

fn arb_value(with_sets: bool) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        // Exact binary fractions keep the decimal rendering lossless.
        (-1_000_000i64..1_000_000).prop_map(|i| Value::from(i as f64 / 8.0)),
        // Whole floats past 2^53 are not the integers their shortest rendering names.
        (any::<i32>(), 53i32..300).prop_map(|(m, e)| Value::from(m as f64 * 2f64.powi(e))),
        ".{0,8}".prop_map(Value::from),
    ];

    leaf.prop_recursive(3, 32, 4, move |inner| {
        let arrays = prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from);
        let objects = prop::collection::btree_map("[a-z]{0,4}", inner.clone(), 0..4).prop_map(
            |m| {
                Value::from(
                    m.into_iter()
                        .map(|(k, v)| (Value::from(k), v))
                        .collect::<BTreeMap<_, _>>(),
                )
            },
        );
        if with_sets {
            let sets = prop::collection::btree_set(inner, 0..4).prop_map(Value::from);
            prop_oneof![arrays, objects, sets].boxed()
        } else {
            prop_oneof![arrays, objects].boxed()
        }
    })
}

proptest! {
    #[test]
    fn order_is_total(a in arb_value(true), b in arb_value(true), c in arb_value(true)) {
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        prop_assert_eq!(a == b, a.cmp(&b) == Ordering::Equal);
        if a <= b && b <= c {
            prop_assert!(a <= c);
        }
    }

    #[test]
    fn json_round_trip(v in arb_value(false)) {
        let json = v.to_json_str().unwrap();
        prop_assert_eq!(Value::from_json_str(&json).unwrap(), v);
    }
}
