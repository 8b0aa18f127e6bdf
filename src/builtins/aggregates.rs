// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{ensure_args_count, ensure_numeric};
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::number::Number;
use crate::value::Value;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("count", (count, 1));
    m.insert("max", (max, 1));
    m.insert("min", (min, 1));
    m.insert("product", (product, 1));
    m.insert("sort", (sort, 1));
    m.insert("sum", (sum, 1));
}

fn count(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("count", args, 1)?;

    Ok(Value::from(match &args[0] {
        Value::Array(a) => a.len(),
        Value::Set(a) => a.len(),
        Value::Object(a) => a.len(),
        // Unicode code points, not bytes.
        Value::String(a) => a.chars().count(),
        a => {
            return Err(BuiltinError::eval(
                "count",
                format!("`count` requires array/object/set/string argument. Got `{a}`."),
            ))
        }
    }))
}

fn max(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("max", args, 1)?;

    Ok(match &args[0] {
        Value::Array(a) => a.iter().max().cloned().unwrap_or(Value::Undefined),
        Value::Set(a) => a.iter().next_back().cloned().unwrap_or(Value::Undefined),
        a => {
            return Err(BuiltinError::eval(
                "max",
                format!("`max` requires array/set argument. Got `{a}`."),
            ))
        }
    })
}

fn min(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("min", args, 1)?;

    Ok(match &args[0] {
        Value::Array(a) => a.iter().min().cloned().unwrap_or(Value::Undefined),
        Value::Set(a) => a.iter().next().cloned().unwrap_or(Value::Undefined),
        a => {
            return Err(BuiltinError::eval(
                "min",
                format!("`min` requires array/set argument. Got `{a}`."),
            ))
        }
    })
}

fn fold_numbers<'a>(
    name: &'static str,
    items: impl Iterator<Item = &'a Value>,
    init: Number,
    op: fn(&Number, &Number) -> anyhow::Result<Number>,
) -> Result<Value, BuiltinError> {
    let mut v = init;
    for e in items {
        let n = ensure_numeric(name, e)?;
        v = op(&v, &n).map_err(|e| BuiltinError::eval(name, e.to_string()))?;
    }
    Ok(Value::from(v))
}

fn product(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("product", args, 1)?;

    match &args[0] {
        Value::Array(a) => fold_numbers("product", a.iter(), Number::from(1u64), Number::mul),
        Value::Set(a) => fold_numbers("product", a.iter(), Number::from(1u64), Number::mul),
        a => Err(BuiltinError::eval(
            "product",
            format!("`product` requires array/set argument. Got `{a}`."),
        )),
    }
}

fn sort(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("sort", args, 1)?;
    Ok(match &args[0] {
        Value::Array(a) => {
            let mut ac = (**a).clone();
            ac.sort();
            Value::from_array(ac)
        }
        // Sets are already ordered.
        Value::Set(a) => Value::from_array(a.iter().cloned().collect()),
        a => {
            return Err(BuiltinError::eval(
                "sort",
                format!("`sort` requires array/set argument. Got `{a}`."),
            ))
        }
    })
}

fn sum(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("sum", args, 1)?;

    match &args[0] {
        Value::Array(a) => fold_numbers("sum", a.iter(), Number::from(0u64), Number::add),
        Value::Set(a) => fold_numbers("sum", a.iter(), Number::from(0u64), Number::add),
        a => Err(BuiltinError::eval(
            "sum",
            format!("`sum` requires array/set argument. Got `{a}`."),
        )),
    }
}
