// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::types::{FunctionType, RegoType};

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Signature and traits of one builtin, in OPA capabilities format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltinMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    /// Omitted for namespaced builtins; `array.concat` belongs to `array`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub categories: Option<Vec<String>>,

    #[serde(with = "decl")]
    pub decl: FunctionType,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub infix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub relation: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nondeterministic: Option<bool>,

    #[serde(skip_serializing, default)]
    pub deprecated: bool,

    /// False when the implementation reads the builtin context.
    #[serde(skip_serializing, default = "default_true")]
    pub can_skip_bctx: bool,
}

fn default_true() -> bool {
    true
}

mod decl {
    use super::*;
    use serde::de::{self, Deserializer};
    use serde::ser::Serializer;

    pub fn serialize<S: Serializer>(f: &FunctionType, s: S) -> Result<S::Ok, S::Error> {
        RegoType::Function(f.clone()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<FunctionType, D::Error> {
        match RegoType::deserialize(d)? {
            RegoType::Function(f) => Ok(f),
            t => Err(de::Error::custom(format!(
                "builtin declaration must be a function type, got `{t}`"
            ))),
        }
    }
}

#[derive(Deserialize)]
struct Capabilities {
    builtins: Vec<BuiltinMetadata>,
}

lazy_static! {
    /// Metadata for every builtin this crate implements.
    pub static ref METADATA: HashMap<String, BuiltinMetadata> = {
        let caps: Capabilities = serde_json::from_str(include_str!("capabilities.json"))
            .expect("embedded capabilities.json is valid");
        caps.builtins.into_iter().map(|m| (m.name.clone(), m)).collect()
    };
}

impl BuiltinMetadata {
    pub fn new(name: impl Into<String>, decl: FunctionType) -> Self {
        Self {
            name: name.into(),
            description: None,
            categories: None,
            decl,
            infix: None,
            relation: None,
            nondeterministic: None,
            deprecated: false,
            can_skip_bctx: true,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_infix(mut self, infix: impl Into<String>) -> Self {
        self.infix = Some(infix.into());
        self
    }

    pub fn with_relation(mut self, relation: bool) -> Self {
        self.relation = Some(relation);
        self
    }

    pub fn with_nondeterministic(mut self, nondeterministic: bool) -> Self {
        self.nondeterministic = Some(nondeterministic);
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn with_can_skip_bctx(mut self, can_skip_bctx: bool) -> Self {
        self.can_skip_bctx = can_skip_bctx;
        self
    }

    /// Number of fixed arguments.
    pub fn arity(&self) -> usize {
        self.decl.args.len()
    }

    pub fn is_variadic(&self) -> bool {
        self.decl.variadic.is_some()
    }

    pub fn is_nondeterministic(&self) -> bool {
        self.nondeterministic.unwrap_or(false)
    }

    pub fn is_relation(&self) -> bool {
        self.relation.unwrap_or(false)
    }

    /// Declared categories, or the namespace of a dotted name.
    pub fn category_list(&self) -> Vec<String> {
        match (&self.categories, self.name.split_once('.')) {
            (Some(c), _) => c.clone(),
            (None, Some((prefix, _))) => vec![prefix.to_string()],
            (None, None) => vec![],
        }
    }
}
