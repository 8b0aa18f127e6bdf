// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::trace::Location;

use thiserror::Error;

/// How a failing builtin affects the enclosing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Always propagated, regardless of strict mode.
    Halting,
    /// Propagated in strict mode, otherwise the call evaluates to undefined.
    Ordinary,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}{name}: {message}", location_prefix(.location))]
pub struct BuiltinError {
    pub kind: ErrorKind,
    pub name: String,
    pub message: String,
    pub location: Option<Location>,
}

fn location_prefix(location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!("{loc}: "),
        None => String::new(),
    }
}

impl BuiltinError {
    /// An ordinary evaluation error.
    pub fn eval(name: &str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Ordinary,
            name: name.to_string(),
            message: message.into(),
            location: None,
        }
    }

    pub fn halt(name: &str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Halting,
            name: name.to_string(),
            message: message.into(),
            location: None,
        }
    }

    pub fn is_halting(&self) -> bool {
        self.kind == ErrorKind::Halting
    }

    /// Records the call site unless one is already set.
    pub fn at(mut self, location: Option<&Location>) -> Self {
        if self.location.is_none() {
            self.location = location.cloned();
        }
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("unknown builtin function `{name}`")]
    BuiltinNotFound { name: String },

    #[error(transparent)]
    Builtin(#[from] BuiltinError),
}
