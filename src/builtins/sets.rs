// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{ensure_args_count, ensure_set};
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::value::Value;

use std::collections::BTreeSet;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("and", (and, 2));
    m.insert("intersection", (intersection_of_set_of_sets, 1));
    m.insert("or", (or, 2));
    m.insert("union", (union_of_set_of_sets, 1));
}

pub fn intersection(v1: &Value, v2: &Value) -> Result<Value, BuiltinError> {
    let s1 = ensure_set("intersection", v1)?;
    let s2 = ensure_set("intersection", v2)?;
    Ok(Value::from_set(s1.intersection(&s2).cloned().collect()))
}

pub fn union(v1: &Value, v2: &Value) -> Result<Value, BuiltinError> {
    let s1 = ensure_set("union", v1)?;
    let s2 = ensure_set("union", v2)?;
    Ok(Value::from_set(s1.union(&s2).cloned().collect()))
}

// `x & y`
fn and(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("and", args, 2)?;
    intersection(&args[0], &args[1])
}

// `x | y`
fn or(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("or", args, 2)?;
    union(&args[0], &args[1])
}

fn intersection_of_set_of_sets(
    _ctx: &BuiltinContext,
    args: &[Value],
) -> Result<Value, BuiltinError> {
    let name = "intersection";
    ensure_args_count(name, args, 1)?;
    let set = ensure_set(name, &args[0])?;

    let mut res = BTreeSet::new();
    let mut first = true;

    for s in set.iter() {
        let s = match s {
            Value::Set(s) => s,
            _ => {
                return Err(BuiltinError::eval(
                    name,
                    format!("`{name}` expects set of sets. Got `{}`", args[0]),
                ))
            }
        };

        if first {
            res = (**s).clone();
            first = false;
        } else {
            res = res.intersection(s).cloned().collect();
        }
    }

    Ok(Value::from_set(res))
}

fn union_of_set_of_sets(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "union";
    ensure_args_count(name, args, 1)?;
    let set = ensure_set(name, &args[0])?;

    let mut res = BTreeSet::new();

    for s in set.iter() {
        let s = match s {
            Value::Set(s) => s,
            _ => {
                return Err(BuiltinError::eval(
                    name,
                    format!("`{name}` expects set of sets. Got `{}`", args[0]),
                ))
            }
        };

        res.extend(s.iter().cloned());
    }

    Ok(Value::from_set(res))
}
