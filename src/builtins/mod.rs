// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod aggregates;
pub mod arrays;
pub mod bitwise;
pub mod collections;
pub mod comparison;
pub mod conversions;

#[cfg(feature = "crypto")]
pub mod crypto;
pub mod encoding;
pub mod numbers;
pub mod objects;
pub mod sets;
pub mod strings;
pub mod time;
pub mod tracing;
pub mod types;
pub mod units;
pub mod utils;

#[cfg(feature = "uuid")]
pub mod uuid;

mod context;
mod error;
mod metadata;

pub use context::{BuiltinContext, BuiltinsCache};
pub use error::{BuiltinError, ErrorKind, RegistryError};
pub use metadata::{BuiltinMetadata, METADATA};

use crate::types::FunctionType;
use crate::value::Value;

use std::collections::{BTreeSet, HashMap};

use lazy_static::lazy_static;
use serde::Serialize;

pub type BuiltinFcn = fn(&BuiltinContext, &[Value]) -> Result<Value, BuiltinError>;

pub type BuiltinsMap<K, V> = HashMap<K, V>;

#[rustfmt::skip]
lazy_static! {
    pub static ref BUILTINS: BuiltinsMap<&'static str, (BuiltinFcn, u8)> = {
	let mut m : BuiltinsMap<&'static str, (BuiltinFcn, u8)>  = BuiltinsMap::new();

	numbers::register(&mut m);
	aggregates::register(&mut m);
	arrays::register(&mut m);
	bitwise::register(&mut m);
	collections::register(&mut m);
	comparison::register(&mut m);
	conversions::register(&mut m);

	#[cfg(feature = "crypto")]
	crypto::register(&mut m);
	encoding::register(&mut m);
	objects::register(&mut m);
	sets::register(&mut m);
	strings::register(&mut m);
	time::register(&mut m);
	tracing::register(&mut m);
	types::register(&mut m);
	units::register(&mut m);

	#[cfg(feature = "uuid")]
	uuid::register(&mut m);

	m
    };
}

/// Builtins whose results must be memoized per query even when their
/// metadata does not mark them nondeterministic.
pub fn must_cache(path: &str) -> Option<&'static str> {
    match path {
        "rand.intn" => Some("rand.intn"),
        "uuid.rfc4122" => Some("uuid.rfc4122"),
        _ => None,
    }
}

#[derive(Clone)]
struct Entry {
    fcn: BuiltinFcn,
    metadata: BuiltinMetadata,
}

/// Name to implementation and metadata. Read-only once built, and safe to
/// share between threads evaluating independent queries.
#[derive(Clone)]
pub struct BuiltinRegistry {
    builtins: HashMap<String, Entry>,
}

impl core::fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("BuiltinRegistry")
            .field("builtins", &self.supported_builtin_names())
            .finish()
    }
}

impl Default for BuiltinRegistry {
    /// Every builtin compiled into the crate.
    fn default() -> Self {
        let mut builtins = HashMap::new();
        for (name, (fcn, nargs)) in BUILTINS.iter() {
            let metadata = match METADATA.get(*name) {
                Some(m) => m.clone(),
                None => {
                    let args = (0..*nargs).map(|_| crate::RegoType::any()).collect();
                    BuiltinMetadata::new(*name, FunctionType::new(args, None))
                }
            };
            builtins.insert(name.to_string(), Entry { fcn: *fcn, metadata });
        }
        Self { builtins }
    }
}

#[derive(Serialize)]
struct CapabilitiesDoc<'a> {
    builtins: Vec<&'a BuiltinMetadata>,
}

impl BuiltinRegistry {
    /// A registry with no builtins.
    pub fn empty() -> Self {
        Self {
            builtins: HashMap::new(),
        }
    }

    /// Registers a host-provided builtin, replacing any builtin of the same name.
    pub fn with_builtin(
        mut self,
        name: impl Into<String>,
        fcn: BuiltinFcn,
        metadata: BuiltinMetadata,
    ) -> Self {
        self.builtins.insert(name.into(), Entry { fcn, metadata });
        self
    }

    pub fn lookup(&self, name: &str) -> Option<BuiltinFcn> {
        self.builtins.get(name).map(|e| e.fcn)
    }

    pub fn metadata(&self, name: &str) -> Option<&BuiltinMetadata> {
        self.builtins.get(name).map(|e| &e.metadata)
    }

    pub fn supported_builtin_names(&self) -> BTreeSet<String> {
        self.builtins.keys().cloned().collect()
    }

    /// OPA capabilities document listing the supported builtins.
    pub fn capabilities_json(&self) -> Result<String, serde_json::Error> {
        let mut builtins: Vec<_> = self.builtins.values().map(|e| &e.metadata).collect();
        builtins.sort_by(|a, b| a.name.cmp(&b.name));
        serde_json::to_string_pretty(&CapabilitiesDoc { builtins })
    }

    /// Checks `args` against the declaration of `name` and calls it.
    ///
    /// Halting errors always propagate. Ordinary errors propagate in strict
    /// mode and evaluate to [`Value::Undefined`] otherwise.
    pub fn invoke(
        &self,
        ctx: &BuiltinContext,
        name: &str,
        args: &[Value],
        strict: bool,
    ) -> Result<Value, RegistryError> {
        let Some(entry) = self.builtins.get(name) else {
            return Err(RegistryError::BuiltinNotFound {
                name: name.to_string(),
            });
        };

        ::tracing::debug!(builtin = name, args = args.len(), "invoking builtin");

        let result = check_args(name, &entry.metadata.decl, args)
            .and_then(|_| call(ctx, name, entry, args));

        match result {
            Ok(v) => Ok(v),
            Err(e) => {
                let e = e.at(ctx.location.as_ref());
                if e.is_halting() || strict {
                    Err(e.into())
                } else {
                    ::tracing::debug!(builtin = name, error = %e, "builtin failed; result is undefined");
                    Ok(Value::Undefined)
                }
            }
        }
    }
}

fn check_args(name: &str, decl: &FunctionType, args: &[Value]) -> Result<(), BuiltinError> {
    let expected = decl.args.len();
    let arity_ok = match decl.variadic {
        Some(_) => args.len() >= expected,
        None => args.len() == expected,
    };
    if !arity_ok {
        return Err(BuiltinError::halt(
            name,
            format!(
                "`{name}` expects {expected} argument(s). Got {} instead",
                args.len()
            ),
        ));
    }

    for (idx, arg) in args.iter().enumerate() {
        if arg.is_undefined() {
            continue;
        }
        if let Some(ty) = decl.arg_type(idx) {
            if !ty.matches(arg) {
                return Err(BuiltinError::eval(
                    name,
                    format!(
                        "`{name}` expects argument {} of type `{}`. Got `{arg}` instead",
                        idx + 1,
                        ty.unnamed()
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn call(
    ctx: &BuiltinContext,
    name: &str,
    entry: &Entry,
    args: &[Value],
) -> Result<Value, BuiltinError> {
    if !entry.metadata.is_nondeterministic() && must_cache(name).is_none() {
        return (entry.fcn)(ctx, args);
    }

    if let Some(v) = ctx.cache.borrow().get(name, args) {
        ::tracing::trace!(builtin = name, "using cached result");
        return Ok(v.clone());
    }

    let v = (entry.fcn)(ctx, args)?;
    ctx.cache.borrow_mut().insert(name, args, v.clone());
    Ok(v)
}
