// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::number::Number;
use crate::Rc;

use core::fmt;
use std::collections::{BTreeMap, BTreeSet};
use std::ops;
use std::path::Path;
use std::str::FromStr;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while decoding, encoding or patching values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("failed to decode json: {0}")]
    Decode(String),

    #[error("undefined cannot be represented in json")]
    UndefinedInJson,

    #[error("failed to encode json: {0}")]
    Encode(String),

    #[error("conflicting values at `{path}`")]
    PatchConflict { path: String },

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

// We cannot use serde_json::Value because Rego has set type and object's key can be
// other rego values.
//
// The declaration order of the variants is the cross-kind ordering used for
// sorting and for set/object keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    // Json data types. serde will automatically map json to these variants.
    Null,
    Bool(bool),
    Number(Number),
    String(Rc<str>),
    Array(Rc<Vec<Value>>),
    Object(Rc<BTreeMap<Value, Value>>),

    // Extra rego data type
    Set(Rc<BTreeSet<Value>>),

    // Indicate that a value is undefined
    Undefined,
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::Error;
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::String(s) => serializer.serialize_str(s.as_ref()),
            Value::Number(n) => n.serialize(serializer),
            Value::Array(a) => a.serialize(serializer),
            Value::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields.iter() {
                    match k {
                        Value::String(_) => map.serialize_entry(k, v)?,
                        _ => {
                            let key_str = serde_json::to_string(k).map_err(Error::custom)?;
                            map.serialize_entry(&key_str, v)?
                        }
                    }
                }
                map.end()
            }

            // json has no sets
            Value::Set(s) => s.serialize(serializer),

            Value::Undefined => Err(Error::custom(ValueError::UndefinedInJson)),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a value")
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Null)
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Bool(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(v))
    }

    fn visit_u128<E>(self, v: u128) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(v))
    }

    fn visit_i128<E>(self, v: i128) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(v))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(v))
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(s))
    }

    fn visit_string<E>(self, s: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(s))
    }

    fn visit_seq<V>(self, mut visitor: V) -> Result<Self::Value, V::Error>
    where
        V: SeqAccess<'de>,
    {
        let mut arr = vec![];
        while let Some(v) = visitor.next_element()? {
            arr.push(v);
        }
        Ok(Value::from(arr))
    }

    fn visit_map<V>(self, mut visitor: V) -> Result<Self::Value, V::Error>
    where
        V: MapAccess<'de>,
    {
        if let Some((key, value)) = visitor.next_entry()? {
            // serde_json hands arbitrary precision numbers over as a single entry map.
            if let (Value::String(k), Value::String(v)) = (&key, &value) {
                if k.as_ref() == "$serde_json::private::Number" {
                    return match Number::from_str(v) {
                        Ok(n) => Ok(Value::from(n)),
                        _ => Err(de::Error::custom("failed to read big number")),
                    };
                }
            }
            let mut map = BTreeMap::new();
            map.insert(key, value);
            while let Some((key, value)) = visitor.next_entry()? {
                map.insert(key, value);
            }
            Ok(Value::from(map))
        } else {
            Ok(Value::new_object())
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => f.write_str(&self.to_rego_string()),
        }
    }
}

fn encode_error(e: serde_json::Error) -> ValueError {
    let message = e.to_string();
    if message == ValueError::UndefinedInJson.to_string() {
        ValueError::UndefinedInJson
    } else {
        ValueError::Encode(message)
    }
}

impl Value {
    pub fn new_object() -> Value {
        Value::from(BTreeMap::new())
    }

    pub fn new_set() -> Value {
        Value::from(BTreeSet::new())
    }

    pub fn new_array() -> Value {
        Value::from(vec![])
    }

    pub fn from_json_str(json: &str) -> Result<Value, ValueError> {
        serde_json::from_str(json).map_err(|e| ValueError::Decode(e.to_string()))
    }

    pub fn from_json_bytes(json: &[u8]) -> Result<Value, ValueError> {
        serde_json::from_slice(json).map_err(|e| ValueError::Decode(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Value, ValueError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ValueError::Decode(format!("{}: {e}", path.display())))?;
        Self::from_json_bytes(&bytes)
    }

    pub fn to_json_str(&self) -> Result<String, ValueError> {
        serde_json::to_string_pretty(self).map_err(encode_error)
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ValueError> {
        serde_json::to_vec(self).map_err(encode_error)
    }

    /// Renders the value in Rego literal syntax, e.g. `{1, 2}` for a set and
    /// `set()` for the empty set. Top-level strings are quoted.
    pub fn to_rego_string(&self) -> String {
        let mut out = String::new();
        self.write_rego(&mut out);
        out
    }

    fn write_rego(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&n.format_decimal()),
            Value::String(s) => match serde_json::to_string(s.as_ref()) {
                Ok(q) => out.push_str(&q),
                Err(_) => out.push_str(s),
            },
            Value::Array(a) => {
                out.push('[');
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    v.write_rego(out);
                }
                out.push(']');
            }
            Value::Object(fields) => {
                out.push('{');
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    k.write_rego(out);
                    out.push_str(": ");
                    v.write_rego(out);
                }
                out.push('}');
            }
            Value::Set(s) if s.is_empty() => out.push_str("set()"),
            Value::Set(s) => {
                out.push('{');
                for (i, v) in s.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    v.write_rego(out);
                }
                out.push('}');
            }
            Value::Undefined => out.push_str("<undefined>"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Number(Number::from(n))
            }
        }
    )*};
}

number_from!(u128, i128, u64, i64, i32, f64, usize);

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(Rc::new(a))
    }
}

impl From<BTreeSet<Value>> for Value {
    fn from(s: BTreeSet<Value>) -> Self {
        Value::Set(Rc::new(s))
    }
}

impl From<BTreeMap<Value, Value>> for Value {
    fn from(s: BTreeMap<Value, Value>) -> Self {
        Value::Object(Rc::new(s))
    }
}

impl Value {
    pub fn from_array(a: Vec<Value>) -> Value {
        Value::from(a)
    }

    pub fn from_set(s: BTreeSet<Value>) -> Value {
        Value::from(s)
    }

    pub fn from_map(m: BTreeMap<Value, Value>) -> Value {
        Value::from(m)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Name of the value's kind as reported by `type_name`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Set(_) => "set",
            Value::Undefined => "undefined",
        }
    }

    fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }

    pub fn as_bool(&self) -> Result<&bool, ValueError> {
        match self {
            Value::Bool(b) => Ok(b),
            _ => Err(self.mismatch("boolean")),
        }
    }

    pub fn as_string(&self) -> Result<&Rc<str>, ValueError> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch("string")),
        }
    }

    pub fn as_number(&self) -> Result<&Number, ValueError> {
        match self {
            Value::Number(n) => Ok(n),
            _ => Err(self.mismatch("number")),
        }
    }

    pub fn as_array(&self) -> Result<&Vec<Value>, ValueError> {
        match self {
            Value::Array(a) => Ok(a),
            _ => Err(self.mismatch("array")),
        }
    }

    /// Mutable access. Shared storage is cloned first.
    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Value>, ValueError> {
        match self {
            Value::Array(a) => Ok(Rc::make_mut(a)),
            v => Err(v.mismatch("array")),
        }
    }

    pub fn as_set(&self) -> Result<&BTreeSet<Value>, ValueError> {
        match self {
            Value::Set(s) => Ok(s),
            _ => Err(self.mismatch("set")),
        }
    }

    pub fn as_set_mut(&mut self) -> Result<&mut BTreeSet<Value>, ValueError> {
        match self {
            Value::Set(s) => Ok(Rc::make_mut(s)),
            v => Err(v.mismatch("set")),
        }
    }

    pub fn as_object(&self) -> Result<&BTreeMap<Value, Value>, ValueError> {
        match self {
            Value::Object(m) => Ok(m),
            _ => Err(self.mismatch("object")),
        }
    }

    pub fn as_object_mut(&mut self) -> Result<&mut BTreeMap<Value, Value>, ValueError> {
        match self {
            Value::Object(m) => Ok(Rc::make_mut(m)),
            v => Err(v.mismatch("object")),
        }
    }
}

impl Value {
    /// Returns the value at `path`, creating empty objects along the way.
    fn make_path_mut(&mut self, path: &[&str]) -> Result<&mut Value, ValueError> {
        let mut cur = self;
        for (idx, segment) in path.iter().enumerate() {
            if cur.is_undefined() {
                *cur = Value::new_object();
            }
            cur = match cur {
                Value::Object(map) => Rc::make_mut(map)
                    .entry(Value::from(*segment))
                    .or_insert(Value::Undefined),
                _ => {
                    return Err(ValueError::PatchConflict {
                        path: path[..idx].join("/"),
                    })
                }
            };
        }
        Ok(cur)
    }

    /// Deep-merges `overlay` into this value at `path`.
    ///
    /// Objects merge key by key. Any other pair of differing values at the
    /// same location is a [`ValueError::PatchConflict`].
    pub fn merge_at(&mut self, path: &[&str], overlay: Value) -> Result<(), ValueError> {
        let joined = path.join("/");
        let target = self.make_path_mut(path)?;
        deep_merge(target, overlay, &joined)
    }

    /// Non-mutating form of [`Value::merge_at`].
    pub fn patch(&self, path: &[&str], overlay: Value) -> Result<Value, ValueError> {
        let mut patched = self.clone();
        patched.merge_at(path, overlay)?;
        Ok(patched)
    }
}

fn deep_merge(base: &mut Value, overlay: Value, path: &str) -> Result<(), ValueError> {
    if base.is_undefined() {
        *base = overlay;
        return Ok(());
    }
    if *base == overlay {
        return Ok(());
    }

    match (base, overlay) {
        (Value::Object(current), Value::Object(incoming)) => {
            let current = Rc::make_mut(current);
            for (k, v) in incoming.iter() {
                match current.get_mut(k) {
                    Some(existing) => {
                        let child = match k {
                            Value::String(s) if path.is_empty() => s.to_string(),
                            Value::String(s) => format!("{path}/{s}"),
                            _ => format!("{path}/{k}"),
                        };
                        deep_merge(existing, v.clone(), &child)?
                    }
                    None => {
                        current.insert(k.clone(), v.clone());
                    }
                }
            }
            Ok(())
        }
        _ => Err(ValueError::PatchConflict {
            path: path.to_string(),
        }),
    }
}

impl ops::Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        match self {
            Value::Array(a) if index < a.len() => &a[index],
            _ => &Value::Undefined,
        }
    }
}

impl ops::Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Self::Output {
        &self[&Value::from(key)]
    }
}

impl ops::Index<&Value> for Value {
    type Output = Value;

    fn index(&self, key: &Value) -> &Self::Output {
        match (self, key) {
            (Value::Object(o), _) => o.get(key).unwrap_or(&Value::Undefined),
            (Value::Set(s), _) => s.get(key).unwrap_or(&Value::Undefined),
            (Value::Array(a), Value::Number(n)) => match n.as_u64() {
                Some(index) if (index as usize) < a.len() => &a[index as usize],
                _ => &Value::Undefined,
            },
            _ => &Value::Undefined,
        }
    }
}
