// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Type algebra used to describe builtin signatures.
//!
//! The JSON form is the one OPA uses in its capabilities documents:
//!
//! ```json
//! {
//!   "type": "function",
//!   "args": [
//!     { "type": "string", "name": "search", "description": "the string to search in" },
//!     { "type": "string", "name": "base", "description": "substring to look for" }
//!   ],
//!   "result": { "type": "boolean", "name": "result" }
//! }
//! ```
//!
//! Every variant carries a `type` discriminator. Named types are flattened: the
//! `name` and `description` fields sit next to the fields of the type they name.

use core::fmt;

use thiserror::Error;

use crate::value::Value;

mod codec;
mod matching;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown type marker `{0}`")]
    UnknownTypeMarker(String),

    #[error("type is missing the `type` field")]
    MissingTypeMarker,

    #[error("invalid type: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegoType {
    Null,
    Boolean,
    String,
    Number,

    /// Any of the listed types. An empty list accepts every value.
    Any(Vec<RegoType>),

    /// Elements at index `i` use `static_types[i]`; the rest use `dynamic`.
    Array {
        static_types: Vec<RegoType>,
        dynamic: Option<Box<RegoType>>,
    },

    Set {
        of: Option<Box<RegoType>>,
    },

    Object {
        static_props: Vec<StaticProperty>,
        dynamic: Option<Box<DynamicProperty>>,
    },

    Function(FunctionType),

    Named {
        name: String,
        description: Option<String>,
        ty: Box<RegoType>,
    },
}

/// A property that must be present under a fixed key.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticProperty {
    pub key: Value,
    pub value: RegoType,
}

/// Types of the keys and values not covered by static properties.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicProperty {
    pub key: RegoType,
    pub value: RegoType,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionType {
    pub args: Vec<RegoType>,
    pub result: Option<Box<RegoType>>,
    pub variadic: Option<Box<RegoType>>,
}

impl RegoType {
    pub fn any() -> Self {
        RegoType::Any(vec![])
    }

    pub fn any_of(types: Vec<RegoType>) -> Self {
        RegoType::Any(types)
    }

    pub fn array_of(elem: RegoType) -> Self {
        RegoType::Array {
            static_types: vec![],
            dynamic: Some(Box::new(elem)),
        }
    }

    pub fn set_of(elem: RegoType) -> Self {
        RegoType::Set {
            of: Some(Box::new(elem)),
        }
    }

    pub fn object_of(key: RegoType, value: RegoType) -> Self {
        RegoType::Object {
            static_props: vec![],
            dynamic: Some(Box::new(DynamicProperty { key, value })),
        }
    }

    pub fn function(args: Vec<RegoType>, result: RegoType) -> Self {
        RegoType::Function(FunctionType {
            args,
            result: Some(Box::new(result)),
            variadic: None,
        })
    }

    /// Wraps the type with a name.
    pub fn named(self, name: impl Into<String>) -> Self {
        RegoType::Named {
            name: name.into(),
            description: None,
            ty: Box::new(self),
        }
    }

    /// Attaches a description. Unnamed types are left unchanged.
    pub fn described(self, text: impl Into<String>) -> Self {
        match self {
            RegoType::Named { name, ty, .. } => RegoType::Named {
                name,
                description: Some(text.into()),
                ty,
            },
            t => t,
        }
    }

    /// The type with every `Named` layer removed.
    pub fn unnamed(&self) -> &RegoType {
        match self {
            RegoType::Named { ty, .. } => ty.unnamed(),
            t => t,
        }
    }

    /// The `type` discriminator used in the JSON form.
    pub fn type_marker(&self) -> &'static str {
        match self {
            RegoType::Null => "null",
            RegoType::Boolean => "boolean",
            RegoType::String => "string",
            RegoType::Number => "number",
            RegoType::Any(_) => "any",
            RegoType::Array { .. } => "array",
            RegoType::Set { .. } => "set",
            RegoType::Object { .. } => "object",
            RegoType::Function(_) => "function",
            RegoType::Named { ty, .. } => ty.type_marker(),
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self.unnamed() {
            RegoType::Function(f) => Some(f),
            _ => None,
        }
    }
}

impl FunctionType {
    pub fn new(args: Vec<RegoType>, result: Option<RegoType>) -> Self {
        Self {
            args,
            result: result.map(Box::new),
            variadic: None,
        }
    }

    pub fn with_variadic(mut self, ty: RegoType) -> Self {
        self.variadic = Some(Box::new(ty));
        self
    }

    /// Type expected at argument position `idx`.
    pub fn arg_type(&self, idx: usize) -> Option<&RegoType> {
        match self.args.get(idx) {
            Some(t) => Some(t),
            None => self.variadic.as_deref(),
        }
    }
}

fn join(types: &[RegoType]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for DynamicProperty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}", join(&self.args))?;
        if let Some(variadic) = &self.variadic {
            if !self.args.is_empty() {
                f.write_str(", ")?;
            }
            write!(f, "{variadic}...")?;
        }
        f.write_str(")")?;
        if let Some(result) = &self.result {
            write!(f, " => {result}")?;
        }
        Ok(())
    }
}

impl fmt::Display for RegoType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RegoType::Any(of) if of.is_empty() => f.write_str("any"),
            RegoType::Any(of) => write!(f, "any<{}>", join(of)),
            RegoType::Array {
                static_types,
                dynamic,
            } => {
                f.write_str("array")?;
                if !static_types.is_empty() {
                    write!(f, "<{}>", join(static_types))?;
                }
                if let Some(d) = dynamic {
                    write!(f, "[{d}]")?;
                }
                Ok(())
            }
            RegoType::Set { of: Some(of) } => write!(f, "set[{of}]"),
            RegoType::Object {
                static_props,
                dynamic,
            } => {
                f.write_str("object")?;
                if !static_props.is_empty() {
                    let props = static_props
                        .iter()
                        .map(|p| format!("{}: {}", p.key, p.value))
                        .collect::<Vec<_>>()
                        .join(", ");
                    write!(f, "<{props}>")?;
                }
                if let Some(d) = dynamic {
                    write!(f, "[{d}]")?;
                }
                Ok(())
            }
            RegoType::Function(func) => func.fmt(f),
            RegoType::Named { name, ty, .. } => write!(f, "{name}: {ty}"),
            t => f.write_str(t.type_marker()),
        }
    }
}
