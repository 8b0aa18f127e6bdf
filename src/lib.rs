// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub mod builtins;
pub mod bundle;
mod number;
mod trace;
mod types;
mod value;

pub use builtins::{
    BuiltinContext, BuiltinError, BuiltinFcn, BuiltinMetadata, BuiltinRegistry, BuiltinsCache,
    ErrorKind, RegistryError,
};
pub use number::{BigInt, Number};
pub use trace::{BufferedTracer, Location, QueryTracer, TraceEvent, TraceOperation};
pub use types::{DynamicProperty, FunctionType, RegoType, StaticProperty, TypeError};
pub use value::{Value, ValueError};

// Values, types and bundles are shared read-only across evaluation threads.
pub(crate) use std::sync::Arc as Rc;

#[cfg(test)]
mod tests;
